/// Platform-specific tool names, selected once per process
use once_cell::sync::Lazy;

/// Tool and shell names substituted into command templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub python: String,
    pub cc: String,
    pub cxx: String,
    /// File name of compiled binaries inside the workspace
    pub exe_name: String,
    /// Shell program and its "run this string" flag
    pub shell: [String; 2],
}

/// Host toolchain for the unsandboxed backend
pub static HOST: Lazy<Toolchain> = Lazy::new(Toolchain::detect_host);

impl Toolchain {
    fn detect_host() -> Self {
        let toolchain = if cfg!(windows) {
            Self {
                python: "python".to_string(),
                cc: "gcc".to_string(),
                cxx: "g++".to_string(),
                exe_name: "a.exe".to_string(),
                shell: ["cmd".to_string(), "/C".to_string()],
            }
        } else {
            Self {
                python: "python3".to_string(),
                cc: "gcc".to_string(),
                cxx: "g++".to_string(),
                exe_name: "a.out".to_string(),
                shell: ["sh".to_string(), "-c".to_string()],
            }
        };
        log::debug!("Host toolchain selected: {:?}", toolchain);
        toolchain
    }

    /// Names used inside the official language images
    pub fn container() -> Self {
        Self {
            python: "python3".to_string(),
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            exe_name: "a.out".to_string(),
            shell: ["sh".to_string(), "-c".to_string()],
        }
    }

    /// argv that runs `command` through this toolchain's shell
    pub fn shell_command(&self, command: &str) -> Vec<String> {
        vec![
            self.shell[0].clone(),
            self.shell[1].clone(),
            command.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_host_toolchain_on_unix() {
        assert_eq!(HOST.python, "python3");
        assert_eq!(HOST.exe_name, "a.out");
        assert_eq!(HOST.shell_command("echo hi"), vec!["sh", "-c", "echo hi"]);
    }

    #[test]
    fn test_container_toolchain_is_platform_independent() {
        let toolchain = Toolchain::container();
        assert_eq!(toolchain.cxx, "g++");
        assert_eq!(toolchain.shell[0], "sh");
    }
}
