use std::path::{Component, Path};
use walkdir::DirEntry;

pub fn is_likely_binary(bytes: &[u8]) -> bool {
    let sample_len = bytes.len().min(8192);
    bytes[..sample_len].contains(&0)
}

pub fn should_visit(entry: &DirEntry, excludes: &[String]) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return true;
    }

    let dir_name = entry.file_name().to_string_lossy();
    !excludes
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(&dir_name))
}

/// Last two path components joined with `/`.
pub fn tail_key(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    match parts.as_slice() {
        [] => path.to_string_lossy().replace('\\', "/"),
        [only] => only.clone(),
        [.., parent, file] => format!("{parent}/{file}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkdir::WalkDir;

    #[test]
    fn tail_key_keeps_parent_and_file() {
        assert_eq!(
            tail_key(Path::new("/srv/app/src/components/Button.vue")),
            "components/Button.vue"
        );
        assert_eq!(tail_key(Path::new("styles/main.css")), "styles/main.css");
        assert_eq!(tail_key(Path::new("main.css")), "main.css");
        assert_eq!(tail_key(Path::new("./main.css")), "main.css");
    }

    #[test]
    fn skips_excluded_directories_but_not_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("node_modules");
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("node_modules/pkg/a.css"), "a{color:red}").unwrap();
        std::fs::write(root.join("b.css"), "b{color:red}").unwrap();

        let excludes = vec!["node_modules".to_string()];
        let files: Vec<String> = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| should_visit(entry, &excludes))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["b.css".to_string()]);
    }

    #[test]
    fn nul_bytes_mark_binary() {
        assert!(is_likely_binary(b"PNG\0\0"));
        assert!(!is_likely_binary(b"a { color: red }"));
    }
}
