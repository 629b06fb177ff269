/// Built-in language table
///
/// Ids follow the Judge0 numbering clients already send. Templates are
/// rendered per backend: host paths and toolchain for the local backend,
/// `/code` paths and in-image tool names for the container backend.
use crate::judge::language::LanguageProfile;

pub const PYTHON3: u32 = 71;
pub const JAVA: u32 = 62;
pub const CPP: u32 = 54;
pub const JAVASCRIPT: u32 = 63;
pub const C: u32 = 50;

pub fn default_languages() -> Vec<LanguageProfile> {
    vec![
        LanguageProfile {
            id: PYTHON3,
            name: "python".to_string(),
            display_name: "Python 3".to_string(),
            extension: "py".to_string(),
            source_name: None,
            compile: None,
            run: "{python} {file}".to_string(),
            image: Some("python:3.9-slim".to_string()),
        },
        LanguageProfile {
            id: JAVA,
            name: "java".to_string(),
            display_name: "Java".to_string(),
            extension: "java".to_string(),
            // javac requires the file name to match the public class
            source_name: Some("Main.java".to_string()),
            compile: Some("javac {file}".to_string()),
            run: "java -cp {dir} Main".to_string(),
            image: Some("openjdk:17-slim".to_string()),
        },
        LanguageProfile {
            id: CPP,
            name: "cpp".to_string(),
            display_name: "C++ (GCC)".to_string(),
            extension: "cpp".to_string(),
            source_name: None,
            compile: Some("{cxx} -o {exe} {file}".to_string()),
            run: "{exe}".to_string(),
            image: Some("gcc:latest".to_string()),
        },
        LanguageProfile {
            id: JAVASCRIPT,
            name: "javascript".to_string(),
            display_name: "JavaScript (Node.js)".to_string(),
            extension: "js".to_string(),
            source_name: None,
            compile: None,
            run: "node {file}".to_string(),
            image: Some("node:18-slim".to_string()),
        },
        LanguageProfile {
            id: C,
            name: "c".to_string(),
            display_name: "C (GCC)".to_string(),
            extension: "c".to_string(),
            source_name: None,
            compile: Some("{cc} -o {exe} {file}".to_string()),
            run: "{exe}".to_string(),
            image: Some("gcc:latest".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_has_an_image() {
        for profile in default_languages() {
            assert!(profile.image.is_some(), "{} lacks an image", profile.name);
        }
    }

    #[test]
    fn test_java_uses_main_class_file() {
        let java = default_languages()
            .into_iter()
            .find(|p| p.id == JAVA)
            .unwrap();
        assert_eq!(java.source_filename(), "Main.java");
        assert!(java.requires_compilation());
    }
}
