use std::fs;
use std::path::{Path, PathBuf};

use render::error::Error;
use render::parameters::Parameters;
use render::processor::{is_template_path, render_dir, resolve_target_path, write_output, FailurePolicy};
use render::renderer::Renderer;
use serde_json::json;
use tempfile::TempDir;

fn renderer() -> Renderer {
    let parameters: Parameters = serde_json::from_value(json!({"name": "world", "nested": {"key": "value"}})).unwrap();
    Renderer::new(parameters)
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_is_template_path() {
    assert!(is_template_path("config.yaml.tmpl"));
    assert!(is_template_path("notes.tpl"));
    assert!(!is_template_path("regular.txt"));
    assert!(!is_template_path("file.tmplx"));
    assert!(!is_template_path(".tmpl"));
}

#[test]
fn test_resolve_target_path() {
    let (path, stripped) = resolve_target_path("config.yaml.tmpl", "output");
    assert_eq!(path, PathBuf::from("output/config.yaml"));
    assert!(stripped);

    let (path, stripped) = resolve_target_path("sub/notes.tpl", "output");
    assert_eq!(path, PathBuf::from("output/sub/notes"));
    assert!(stripped);

    let (path, stripped) = resolve_target_path("sub/regular.txt", "output");
    assert_eq!(path, PathBuf::from("output/sub/regular.txt"));
    assert!(!stripped);
}

#[test_log::test]
fn test_render_dir_mirrors_tree() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let expected = TempDir::new().unwrap();

    write(input.path(), "hello.txt.tmpl", "hello {{ name }}\n");
    write(input.path(), "plain.txt", "no templates here\n");
    write(input.path(), "deep/er/value.tpl", "{{ nested.key }}");
    fs::create_dir_all(input.path().join("empty")).unwrap();

    write(expected.path(), "hello.txt", "hello world\n");
    write(expected.path(), "plain.txt", "no templates here\n");
    write(expected.path(), "deep/er/value", "value");

    renderer().dir_render(input.path(), output.path()).unwrap();

    assert!(!dir_diff::is_different(output.path(), expected.path()).unwrap());
}

#[test_log::test]
fn test_render_dir_copies_binary_files() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let logo = [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00, b'{', b'{'];
    write(input.path(), "a.txt.tmpl", "{{ name }}");
    fs::create_dir_all(input.path().join("assets")).unwrap();
    fs::write(input.path().join("assets/logo.png"), logo).unwrap();

    renderer().dir_render(input.path(), output.path()).unwrap();

    assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "world");
    assert_eq!(fs::read(output.path().join("assets/logo.png")).unwrap(), logo);
}

#[test_log::test]
fn test_render_dir_in_place() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.tmpl", "{{ name }}");
    write(dir.path(), "b.txt", "{{ name }}");

    renderer().dir_render(dir.path(), dir.path()).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("a")).unwrap(), "world");
    assert_eq!(fs::read_to_string(dir.path().join("a.tmpl")).unwrap(), "{{ name }}");
    assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "world");
}

#[test_log::test]
fn test_render_dir_abort_on_first_failure() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "a.tmpl", "{{ missing }}");
    write(input.path(), "b.tmpl", "{{ name }}");

    let err = render_dir(&renderer(), input.path(), output.path(), FailurePolicy::Abort).unwrap_err();

    match err {
        Error::DirEntryError { path, source } => {
            assert_eq!(path, "a.tmpl");
            assert!(matches!(*source, Error::TemplateExecutionError { .. }));
        }
        other => panic!("Expected DirEntryError, got {other:?}"),
    }
    assert!(!output.path().join("a").exists());
    assert!(!output.path().join("b").exists());
}

#[test_log::test]
fn test_render_dir_keep_going() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "a.tmpl", "{{ missing }}");
    write(input.path(), "b.tmpl", "{{ name }}");
    write(input.path(), "c.tmpl", "{{ broken+ }}");

    let err = renderer()
        .with_failure_policy(FailurePolicy::KeepGoing)
        .dir_render(input.path(), output.path())
        .unwrap_err();

    assert!(matches!(err, Error::PartialRender { failed: 2, total: 3, .. }));
    assert!(!output.path().join("a").exists());
    assert_eq!(fs::read_to_string(output.path().join("b")).unwrap(), "world");
    assert!(!output.path().join("c").exists());
}

#[test]
fn test_render_dir_missing_input() {
    let output = TempDir::new().unwrap();

    let result = renderer().dir_render(output.path().join("missing"), output.path());

    assert!(result.is_err());
}

#[test]
fn test_file_render_to_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "in.tmpl", "hello {{ name }}");
    let out = dir.path().join("nested/dir/out.txt");

    renderer().file_render(dir.path().join("in.tmpl"), &out).unwrap();

    assert_eq!(fs::read_to_string(out).unwrap(), "hello world");
}

#[test]
fn test_file_render_failure_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "in.tmpl", "hello {{ missing }}");
    let out = dir.path().join("out.txt");

    let err = renderer().file_render(dir.path().join("in.tmpl"), &out).unwrap_err();

    match err {
        Error::TemplateExecutionError { name, .. } => {
            assert_eq!(name, dir.path().join("in.tmpl").display().to_string())
        }
        other => panic!("Expected TemplateExecutionError, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn test_file_render_missing_input() {
    let dir = TempDir::new().unwrap();

    let err = renderer()
        .file_render(dir.path().join("nope.tmpl"), dir.path().join("out"))
        .unwrap_err();

    assert!(matches!(err, Error::InputUnavailable { .. }));
}

#[test]
fn test_write_output_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    fs::write(&out, "a much longer previous content").unwrap();

    write_output(&out, b"short", None).unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "short");
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[cfg(unix)]
#[test]
fn test_permissions_are_carried_over() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "script.sh.tmpl", "echo {{ name }}");
    fs::set_permissions(dir.path().join("script.sh.tmpl"), fs::Permissions::from_mode(0o755)).unwrap();
    let out = dir.path().join("script.sh");

    renderer().file_render(dir.path().join("script.sh.tmpl"), &out).unwrap();

    let mode = fs::metadata(&out).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);
}
