use super::*;

#[test]
fn test_empty_trail() {
    let mut model = repo_model();
    let context = resolve_with(&mut model, &[], &[]).unwrap();

    assert!(context.is_resolved());
    assert_eq!(context.action(), None);
    assert!(context.trail().is_empty());
    assert!(model.values().is_empty());
}

#[test]
fn test_action_only_trail() {
    let mut model = repo_model();
    let context = resolve_with(&mut model, &[CREATE], &[]).unwrap();

    assert_json_snapshot!(context, @r#"
    {
      "action": "create",
      "object": null,
      "list": null,
      "trail": [
        "create"
      ],
      "resolved": true
    }
    "#);
}

#[test]
fn test_object_trail() {
    let mut model = new_model();
    model
        .define_object(WORKSPACE, "forge workspace", true)
        .unwrap()
        .add_field(ValueKind::String, "path", "workspace path")
        .unwrap()
        .define_actions(&[UPDATE])
        .unwrap();

    let context = resolve_with(&mut model, &[UPDATE, WORKSPACE], &[]).unwrap();

    assert_eq!(context.action(), Some(UPDATE));
    assert_eq!(context.object(), Some(WORKSPACE));
    assert_eq!(context.list(), None);
    assert_eq!(context.trail(), [UPDATE, WORKSPACE]);
    assert_eq!(model.instances(WORKSPACE), vec![WORKSPACE]);
}

#[parameterized(
    keyed_by_argument = { &[("instance", "myrepo"), ("title", "hello")], "myrepo" },
    keyed_by_object_name = { &[("title", "hello")], REPO },
)]
fn test_object_without_list_has_one_instance(values: &[(&str, &str)], key: &str) {
    let mut model = repo_model();
    resolve_with(&mut model, &[CREATE, REPO], values).unwrap();

    assert_eq!(model.instances(REPO), vec![key]);
    assert_eq!(model.get_string(REPO, key, "title"), Some("hello"));
    assert_eq!(model.get_string(REPO, key, ACTION_ATTR), Some(CREATE));
    assert_eq!(model.get_bool(REPO, key, "private"), None);
}

#[test]
fn test_list_instances_receive_plain_flags() {
    let mut model = repo_model();
    let context = resolve_with(
        &mut model,
        &[CREATE, REPO],
        &[("repos", "myinstance:myname,otherinstance"), ("title", "T")],
    )
    .unwrap();

    assert_eq!(context.list(), Some("to_create"));
    assert_json_snapshot!(model.values(), @r#"
    {
      "repo": {
        "myinstance": {
          "action": "create",
          "instance": "myinstance",
          "name": "myname",
          "title": "T"
        },
        "otherinstance": {
          "action": "create",
          "instance": "otherinstance",
          "title": "T"
        }
      }
    }
    "#);
}

/// `maintain` receives the repo lists of `create` and `update`.
fn maintain_model() -> CliModel<MockApp> {
    let mut model = repo_model();
    model
        .on_actions(&[MAINTAIN])
        .unwrap()
        .add_flag(ValueKind::Bool, "dry-run", "only show changes", ParamOptions::new())
        .unwrap()
        .add_flags_from_object_list_actions(REPO, "to_create", &[CREATE, UPDATE])
        .unwrap();
    model
}

#[test]
fn test_propagated_list_on_action_only_trail() {
    let mut model = maintain_model();
    let context = resolve_with(
        &mut model,
        &[MAINTAIN],
        &[("create-repos", "a:x,b"), ("repo-title", "T"), ("dry-run", "true")],
    )
    .unwrap();

    assert_eq!(context.action(), Some(MAINTAIN));
    assert_eq!(context.object(), Some(REPO));
    assert_eq!(context.list(), Some("to_create"));
    assert_eq!(context.trail(), [MAINTAIN]);

    assert_eq!(model.instances(REPO), vec!["a", "b"]);
    assert_eq!(model.get_string(REPO, "a", ACTION_ATTR), Some(CREATE));
    assert_eq!(model.get_string(REPO, "a", "name"), Some("x"));
    assert_eq!(model.get_string(REPO, "a", "title"), Some("T"));
    assert_eq!(model.get_string(REPO, "b", "title"), Some("T"));
    assert_eq!(model.get_action_bool("dry-run"), Some(true));
}

#[test]
fn test_same_instance_under_two_actions_conflicts() {
    let mut model = maintain_model();
    let err = resolve_with(
        &mut model,
        &[MAINTAIN],
        &[("create-repos", "a"), ("update-repos", "b,a")],
    )
    .unwrap_err();

    assert_snapshot!(
        err.to_string(),
        @"unable to create AND update 'repo' instance 'a' at the same time, remove it from one of the two actions"
    );
    assert!(model.values().is_empty());
    assert_eq!(model.context(), &Context::default());
}

#[test]
fn test_list_instances_keep_their_keys() {
    let mut model = repo_model();
    resolve_with(
        &mut model,
        &[CREATE, REPO],
        &[("repos", "a:x,b"), ("instance", "myrepo"), ("title", "T")],
    )
    .unwrap();

    assert_json_snapshot!(model.values(), @r#"
    {
      "repo": {
        "a": {
          "action": "create",
          "instance": "a",
          "name": "x",
          "title": "T"
        },
        "b": {
          "action": "create",
          "instance": "b",
          "title": "T"
        }
      }
    }
    "#);
}

#[test]
fn test_action_flag_on_object_trail() {
    let mut model = repo_model();
    model
        .on_actions(&[CREATE])
        .unwrap()
        .add_flag(ValueKind::Bool, "dry-run", "only show changes", ParamOptions::new())
        .unwrap()
        .add_flag(ValueKind::String, "title", "action title", ParamOptions::new())
        .unwrap();

    model.app_mut().set_context(&[CREATE, REPO]).unwrap();
    model
        .app_mut()
        .set_value_at(&[CREATE], "dry-run", "true")
        .unwrap()
        .set_value_at(&[CREATE], "title", "outer")
        .unwrap()
        .set_value("title", "inner")
        .unwrap();
    let context = model.parse(&[]).unwrap();

    assert_eq!(context.object(), Some(REPO));
    assert_eq!(model.get_action_bool("dry-run"), Some(true));
    assert_eq!(model.get_action_string("title"), Some("inner"));
    assert_eq!(
        model.get_action(CREATE).unwrap().param("title").unwrap().raw_value(),
        Some("outer")
    );
    assert_eq!(model.get_string(REPO, REPO, "title"), Some("inner"));
}

#[test]
fn test_resolution_replaces_previous_values() {
    let mut model = repo_model();
    resolve_with(&mut model, &[CREATE, REPO], &[("repos", "a,b")]).unwrap();
    assert_eq!(model.instances(REPO), vec!["a", "b"]);

    let context = resolve_with(&mut model, &[UPDATE, REPO], &[("repos", "c")]).unwrap();
    assert_eq!(context.action(), Some(UPDATE));
    assert_eq!(model.instances(REPO), vec!["c"]);
    assert_eq!(model.get_string(REPO, "c", ACTION_ATTR), Some(UPDATE));
}

#[test]
fn test_app_flags_load_on_every_resolution() {
    let mut model = repo_model();
    model
        .add_app_flag(ValueKind::Bool, "debug", "debug output", ParamOptions::new())
        .unwrap()
        .add_app_flag(ValueKind::String, "workspace", "workspace path", ParamOptions::new())
        .unwrap();

    model.app_mut().set_context(&[CREATE]).unwrap();
    model.app_mut().set_app_value("debug", "true").unwrap();
    model.parse(&[]).unwrap();
    assert_eq!(model.get_app_bool("debug"), Some(true));
    assert_eq!(model.get_app_string("workspace"), None);

    model.app_mut().set_context(&[]).unwrap();
    model.parse(&[]).unwrap();
    assert_eq!(model.get_app_bool("debug"), None);

    let err = model
        .add_app_flag(ValueKind::String, "debug", "again", ParamOptions::new())
        .err()
        .unwrap();
    assert_eq!(err, ModelError::duplicate(EntityKind::Parameter, "debug"));
}

fn clap_model() -> CliModel<ClapApp> {
    let mut model = CliModel::new(ClapApp::new("forge", "Manage a software forge"));
    model
        .add_app_flag(ValueKind::Bool, "debug", "debug output", ParamOptions::new())
        .unwrap()
        .define_action(CREATE, "Create objects", "Create %s", true)
        .unwrap()
        .add_field_list_capture("w", W_F)
        .unwrap();
    model
        .define_object(REPO, "a source repository", false)
        .unwrap()
        .add_key(ValueKind::String, "instance", "repo instance")
        .unwrap()
        .add_field(ValueKind::String, "name", "upstream name")
        .unwrap()
        .add_field(ValueKind::String, "title", "repo title")
        .unwrap()
        .define_actions(&[CREATE])
        .unwrap()
        .on_all_actions()
        .unwrap()
        .add_field_flag("title", ParamOptions::new().with_short('t'))
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
        .add_actions(&[CREATE])
        .unwrap();
    model
}

#[test]
fn test_clap_end_to_end() {
    let mut model = clap_model();
    let context = model
        .parse(&args(&["--debug", "create", "repo", "--repos", "a:x,b", "-t", "Hello"]))
        .unwrap()
        .clone();

    assert_eq!(context.trail(), [CREATE, REPO]);
    assert_eq!(model.get_app_bool("debug"), Some(true));
    assert_eq!(model.instances(REPO), vec!["a", "b"]);
    assert_eq!(model.get_string(REPO, "a", "name"), Some("x"));
    assert_eq!(model.get_string(REPO, "b", "title"), Some("Hello"));
    assert_eq!(model.get_action_string("title"), Some("Hello"));

    let err = model.parse(&args(&["create", "repo", "--nope"])).unwrap_err();
    assert!(matches!(err, ModelError::Parse(_)));
}

#[test]
fn test_failed_parse_clears_previous_resolution() {
    let mut model = clap_model();
    model
        .parse(&args(&["--debug", "create", "repo", "--title", "Old"]))
        .unwrap();
    assert_eq!(model.get_string(REPO, REPO, "title"), Some("Old"));

    let err = model.parse(&args(&["create", "repo", "--nope"])).unwrap_err();
    assert!(matches!(err, ModelError::Parse(_)));

    assert!(!model.context().is_resolved());
    assert_eq!(model.context().action(), None);
    assert!(model.values().is_empty());
    assert_eq!(model.get_action_string("title"), None);
    assert_eq!(model.get_app_bool("debug"), None);
    let title = model.get_object(REPO).unwrap().action(CREATE).unwrap().param("title").unwrap();
    assert!(!title.is_found());
}

#[test]
fn test_clashing_short_never_reaches_clap() {
    let mut model = clap_model();
    let err = model
        .object(REPO)
        .unwrap()
        .on_actions(&[CREATE])
        .unwrap()
        .add_flag(ValueKind::String, "target", "deploy target", ParamOptions::new().with_short('t'))
        .err()
        .unwrap();
    assert_eq!(err, ModelError::duplicate(EntityKind::Parameter, "-t"));

    model.parse(&args(&["create", "repo", "-t", "Hello"])).unwrap();
    assert_eq!(model.get_action_string("title"), Some("Hello"));
    assert_eq!(model.get_action_string("target"), None);
}
