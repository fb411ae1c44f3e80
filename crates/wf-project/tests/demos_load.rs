use std::path::Path;

#[test]
fn demos_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
    let demos = ["trip_2000m.yaml"];

    for name in demos {
        let path = root.join(name);
        let project = wf_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        wf_project::validate_project(&project)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
        assert!(!project.operations.is_empty());
        assert!(project.preset("wiper trip").is_some());
    }
}
