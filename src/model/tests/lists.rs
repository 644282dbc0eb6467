use super::*;

/// A `tag` object keyed by `name`, decoded from a plain `#w` list.
fn tag_model() -> CliModel<MockApp> {
    let mut model = new_model();
    model
        .define_object("tag", "a tag", false)
        .unwrap()
        .add_key(ValueKind::String, "name", "tag name")
        .unwrap()
        .define_actions(&[CREATE])
        .unwrap()
        .create_list("to_create", ",", "#w")
        .unwrap()
        .field(1, "name")
        .unwrap()
        .add_actions(&[CREATE])
        .unwrap();
    model
}

#[test]
fn test_list_selector_is_composed() {
    let model = repo_model();
    let list = model.get_object(REPO).unwrap().list("to_create").unwrap();

    assert_snapshot!(list.selector(), @"([a-zA-Z0-9_]+)(:([a-zA-Z0-9_]+))?");
    assert_eq!(list.groups(), 3);
    assert_eq!(list.separator(), ",");
    let actions: Vec<&str> = list.actions().collect();
    assert_eq!(actions, vec![CREATE, UPDATE]);
    assert!(!list.is_active_for(MAINTAIN));

    let flag = model.get_object(REPO).unwrap().action(CREATE).unwrap().param("repos").unwrap();
    assert!(flag.is_list());
    assert_eq!(flag.help(), "create one or more a source repository");
}

#[parameterized(
    bad_selector = { ",", "[a-" },
    no_separator = { "", "#w" },
)]
fn test_create_list_rejects(separator: &str, selector: &str) {
    let mut model = repo_model();
    let err = model
        .object(REPO)
        .unwrap()
        .create_list("broken", separator, selector)
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::InvalidPattern { .. }), "{err}");
    assert!(model.get_object(REPO).unwrap().list("broken").is_none());
}

#[test]
fn test_create_list_twice_fails() {
    let mut model = repo_model();
    let err = model
        .object(REPO)
        .unwrap()
        .create_list("to_create", ";", "#w")
        .err()
        .unwrap();
    assert_eq!(err, ModelError::duplicate(EntityKind::List, "to_create"));
    assert_eq!(
        model.get_object(REPO).unwrap().list("to_create").unwrap().separator(),
        ","
    );
}

#[parameterized(
    zero = { 0 },
    past_last_group = { 4 },
)]
fn test_field_position_must_exist(position: usize) {
    let mut model = repo_model();
    let err = model
        .object(REPO)
        .unwrap()
        .create_list("other", ",", "#w(:#w)?")
        .unwrap()
        .field(position, "name")
        .err()
        .unwrap();
    assert_eq!(
        err,
        ModelError::InvalidCapturePosition {
            position,
            pattern: "([a-zA-Z0-9_]+)(:([a-zA-Z0-9_]+))?".to_string(),
            groups: 3,
        }
    );
}

#[test]
fn test_field_must_be_declared() {
    let mut model = repo_model();
    let err = model
        .object(REPO)
        .unwrap()
        .create_list("other", ",", "#w")
        .unwrap()
        .field(1, "owner")
        .err()
        .unwrap();
    assert_snapshot!(err.to_string(), @"unknown field 'owner' on object 'repo'");
}

#[test]
fn test_add_actions_needs_object_action() {
    let mut model = repo_model();
    let err = model
        .object(REPO)
        .unwrap()
        .create_list("other", ";", "#w")
        .unwrap()
        .add_actions(&[MAINTAIN])
        .err()
        .unwrap();
    assert_eq!(err, ModelError::UnknownAction(MAINTAIN.to_string()));
}

#[test]
fn test_add_actions_rejects_repeated_action() {
    let mut model = new_model();
    let err = model
        .define_object("tag", "a tag", false)
        .unwrap()
        .add_key(ValueKind::String, "name", "tag name")
        .unwrap()
        .define_actions(&[CREATE])
        .unwrap()
        .create_list("to_create", ",", "#w")
        .unwrap()
        .field(1, "name")
        .unwrap()
        .add_actions(&[CREATE, CREATE])
        .err()
        .unwrap();

    assert_eq!(err, ModelError::duplicate(EntityKind::Action, CREATE));
    let tag = model.get_object("tag").unwrap();
    assert!(tag.action(CREATE).unwrap().param("tags").is_none());
    assert!(!tag.list("to_create").unwrap().is_active_for(CREATE));
    assert!(model.app().get_flag(&[CREATE, "tag"], "tags").is_none());
}

#[test]
fn test_decode_one_instance_per_element() {
    let mut model = tag_model();
    resolve_with(&mut model, &[CREATE, "tag"], &[("tags", "a,b,c")]).unwrap();

    assert_eq!(model.instances("tag"), vec!["a", "b", "c"]);
    for key in ["a", "b", "c"] {
        assert_eq!(model.get_string("tag", key, "name"), Some(key));
        assert_eq!(model.get_string("tag", key, ACTION_ATTR), Some(CREATE));
    }
}

#[test]
fn test_decode_optional_group() {
    let mut model = repo_model();
    resolve_with(
        &mut model,
        &[CREATE, REPO],
        &[("repos", "myinstance:myname,otherinstance")],
    )
    .unwrap();

    assert_eq!(model.instances(REPO), vec!["myinstance", "otherinstance"]);
    assert_eq!(model.get_string(REPO, "myinstance", "instance"), Some("myinstance"));
    assert_eq!(model.get_string(REPO, "myinstance", "name"), Some("myname"));
    assert_eq!(model.get_string(REPO, "otherinstance", "instance"), Some("otherinstance"));
    assert_eq!(model.get_string(REPO, "otherinstance", "name"), None);
}

#[parameterized(
    empty_elements = { ",a,,b,", vec!["a", "b"] },
    single = { "a", vec!["a"] },
    repeated = { "a,a:x", vec!["a"] },
)]
fn test_decode_elements(raw: &str, expected: Vec<&str>) {
    let mut model = repo_model();
    resolve_with(&mut model, &[CREATE, REPO], &[("repos", raw)]).unwrap();
    assert_eq!(model.instances(REPO), expected);
}

#[test]
fn test_decode_rejects_unmatched_element() {
    let mut model = repo_model();
    let err = resolve_with(&mut model, &[CREATE, REPO], &[("repos", "good,not good")]).unwrap_err();

    assert_snapshot!(
        err.to_string(),
        @"list element 'not good' does not match '([a-zA-Z0-9_]+)(:([a-zA-Z0-9_]+))?'"
    );
    assert!(model.values().is_empty());
    assert!(!model.context().is_resolved());
}

#[test]
fn test_keyless_object_keyed_by_element() {
    let mut model = new_model();
    model
        .define_object("label", "a label", true)
        .unwrap()
        .add_field(ValueKind::String, "text", "label text")
        .unwrap()
        .define_actions(&[CREATE])
        .unwrap()
        .create_list("to_create", " ", "#w")
        .unwrap()
        .field(1, "text")
        .unwrap()
        .add_actions(&[CREATE])
        .unwrap();

    resolve_with(&mut model, &[CREATE, "label"], &[("labels", "bug feature")]).unwrap();

    assert_eq!(model.instances("label"), vec!["bug", "feature"]);
    assert_eq!(model.get_string("label", "feature", "text"), Some("feature"));
}

#[test]
fn test_uncaptured_key_falls_back_to_element() {
    let mut model = repo_model();
    model
        .object(REPO)
        .unwrap()
        .create_list("to_rename", ",", "(?:#w)?=#w")
        .unwrap()
        .field(1, "instance")
        .unwrap()
        .field(2, "name")
        .unwrap();

    let object = model.get_object(REPO).unwrap();
    let instances = object
        .list("to_rename")
        .unwrap()
        .decode(object, "a=b,=c")
        .unwrap();

    let keys: Vec<&str> = instances.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "=c"]);
    assert_eq!(
        instances[1].attrs,
        vec![("name".to_string(), Value::String("c".to_string()))]
    );
}

#[test]
fn test_decode_converts_field_kind() {
    let mut model = new_model();
    model
        .define_object("feature", "a feature toggle", false)
        .unwrap()
        .add_key(ValueKind::String, "name", "feature name")
        .unwrap()
        .add_field(ValueKind::Bool, "enabled", "feature state")
        .unwrap()
        .define_actions(&[UPDATE])
        .unwrap()
        .create_list("to_toggle", ",", "#w=#w")
        .unwrap()
        .field(1, "name")
        .unwrap()
        .field(2, "enabled")
        .unwrap()
        .add_actions(&[UPDATE])
        .unwrap();

    resolve_with(&mut model, &[UPDATE, "feature"], &[("features", "dark=true,beta=FALSE")]).unwrap();
    assert_eq!(model.get_bool("feature", "dark", "enabled"), Some(true));
    assert_eq!(model.get_bool("feature", "beta", "enabled"), Some(false));

    let err = resolve_with(&mut model, &[UPDATE, "feature"], &[("features", "dark=maybe")]).unwrap_err();
    assert!(matches!(err, ModelError::KindMismatch { ref attribute, .. } if attribute == "enabled"));
}
