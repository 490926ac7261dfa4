use jsx_thunks::{transform_file, Options, TransformOutput};

fn run(source: &str, file: &str) -> TransformOutput {
    transform_file(source, file, &Options::default()).expect("transform should not fail")
}

fn code_of(out: TransformOutput) -> String {
    match out {
        TransformOutput::Transformed { code, .. } => code,
        TransformOutput::NotApplicable => panic!("expected a rewrite"),
    }
}

#[test]
fn thunks_conditional_class() {
    let out = run(r#"const el = <div class={active() ? "a" : "b"}/>;"#, "app.tsx");
    let code = code_of(out);
    assert!(code.contains("=>"), "no thunk in output: {code}");
    // Applying the transform to its own output changes nothing further.
    assert_eq!(run(&code, "app.tsx"), TransformOutput::NotApplicable);
}

#[test]
fn thunks_plain_call() {
    let source = "const el = <button disabled={isDisabled()}/>;";
    let code = code_of(run(source, "app.jsx"));
    assert!(code.contains("=>"));
    assert_ne!(code, source);
}

#[test]
fn event_handler_attribute_is_untouched() {
    let out = run("const el = <button onClick={handleClick()}/>;", "app.tsx");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn ref_attribute_is_untouched() {
    let out = run("const el = <input ref={grab()}/>;", "app.tsx");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn static_value_is_untouched() {
    let out = run("const el = <input value={count}/>;", "app.tsx");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn existing_function_is_untouched() {
    let out = run("const el = <div style={() => computeStyle()}/>;", "app.tsx");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn only_qualifying_attributes_are_rewritten() {
    let source = r#"
const el = (
    <section
        class={active() ? "a" : "b"}
        disabled={isDisabled()}
        onClick={handleClick()}
        value={count}
        style={() => computeStyle()}
        title="static"
    />
);
"#;
    let code = code_of(run(source, "page.tsx"));
    // Two fresh thunks plus the style arrow that was already there.
    assert_eq!(code.matches("=>").count(), 3);
    assert_eq!(run(&code, "page.tsx"), TransformOutput::NotApplicable);
}

#[test]
fn non_jsx_extension_is_rejected_before_parsing() {
    // Not even parseable; the extension gate must short-circuit first.
    let out = run("this is ( not : source text <", "notes.txt");
    assert_eq!(out, TransformOutput::NotApplicable);
    // A plain .ts file is not routed either, call or not.
    let out = run("const x = isDisabled();", "app.ts");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn parse_failure_defers_to_the_host() {
    let out = run("const = <<< oops", "broken.tsx");
    assert_eq!(out, TransformOutput::NotApplicable);
}

#[test]
fn type_annotations_are_accepted() {
    let source = "const el = <button disabled={(isDisabled() as boolean)}/>;";
    // The cast wraps the call in an opaque kind, so nothing qualifies, but
    // the file must still parse under the type-aware grammar.
    assert_eq!(run(source, "app.tsx"), TransformOutput::NotApplicable);
    let code = code_of(run(
        "const n: number = 1; const el = <div class={pick()}/>;",
        "app.tsx",
    ));
    assert!(code.contains("=>"));
}

#[test]
fn source_map_names_the_input_file() {
    let out = run("const el = <div class={pick()}/>;", "widgets/app.tsx");
    let TransformOutput::Transformed { map: Some(map), .. } = out else {
        panic!("expected a transformed result with a map");
    };
    assert!(map.contains("\"mappings\""));
    assert!(map.contains("widgets/app.tsx"));
}

#[test]
fn source_map_can_be_disabled() {
    let options = Options::from_json(r#"{ "sourceMap": false }"#).unwrap();
    let out = transform_file("const el = <div class={pick()}/>;", "app.tsx", &options).unwrap();
    let TransformOutput::Transformed { map, .. } = out else {
        panic!("expected a transformed result");
    };
    assert!(map.is_none());
}

#[test]
fn extension_list_is_configurable() {
    let options = Options::from_json(r#"{ "extensions": ["view"] }"#).unwrap();
    let source = "const el = <div class={pick()}/>;";
    let out = transform_file(source, "app.view", &options).unwrap();
    assert!(matches!(out, TransformOutput::Transformed { .. }));
    // The default extensions are replaced, not extended.
    let out = transform_file(source, "app.tsx", &options).unwrap();
    assert_eq!(out, TransformOutput::NotApplicable);
}
