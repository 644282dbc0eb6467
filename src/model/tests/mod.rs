use super::*;
use crate::parser::{ClapApp, MockApp};
use crate::store::ACTION_ATTR;
use crate::types::{ListRef, Value};
use insta::{assert_json_snapshot, assert_snapshot};
use yare::parameterized;

mod context;
mod lists;

const W_F: &str = "[a-zA-Z0-9_]+";

const CREATE: &str = "create";
const UPDATE: &str = "update";
const MAINTAIN: &str = "maintain";

const WORKSPACE: &str = "workspace";
const INFRA: &str = "infra";
const REPO: &str = "repo";

fn new_model() -> CliModel<MockApp> {
    let mut model = CliModel::new(MockApp::new("forge"));
    model
        .define_action(CREATE, "Create objects", "Create %s", true)
        .unwrap()
        .define_action(UPDATE, "Update objects", "Update %s", false)
        .unwrap()
        .define_action(MAINTAIN, "Maintain objects", "Maintain %s", false)
        .unwrap()
        .add_field_list_capture("w", W_F)
        .unwrap();
    model
}

/// A `repo` object with an `instance` key, a `name` field bound by the
/// `to_create` list, and a `title` field only available as a flag.
fn repo_model() -> CliModel<MockApp> {
    let mut model = new_model();
    model
        .define_object(REPO, "a source repository", false)
        .unwrap()
        .add_key(ValueKind::String, "instance", "repo instance")
        .unwrap()
        .add_field(ValueKind::String, "name", "upstream name")
        .unwrap()
        .add_field(ValueKind::String, "title", "repo title")
        .unwrap()
        .add_field(ValueKind::Bool, "private", "private repo")
        .unwrap()
        .define_actions(&[CREATE, UPDATE])
        .unwrap()
        .on_actions(&[CREATE, UPDATE])
        .unwrap()
        .add_field_arg("instance", ParamOptions::new())
        .unwrap()
        .add_field_flag("title", ParamOptions::new().with_short('t'))
        .unwrap()
        .add_field_flag("private", ParamOptions::new())
        .unwrap();
    model
        .object(REPO)
        .unwrap()
        .create_list("to_create", ",", "#w(:#w)?")
        .unwrap()
        .field(1, "instance")
        .unwrap()
        .field(3, "name")
        .unwrap()
        .add_actions(&[CREATE, UPDATE])
        .unwrap();
    model
}

/// Stage `path` with `values` on the mock parser and resolve it.
fn resolve_with(
    model: &mut CliModel<MockApp>,
    path: &[&str],
    values: &[(&str, &str)],
) -> Result<Context, ModelError> {
    model.finalize()?;
    let app = model.app_mut();
    app.set_context(path)?;
    for (name, value) in values {
        app.set_value(name, value)?;
    }
    model.parse(&[]).cloned()
}

fn args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
