//! Native package tool command lines and output parsing.
//!
//! Commands are `Vec<String>` with the program first.

use anyhow::{Result, bail};

use crate::package::PackageAction;
use crate::platform::PlatformFamily;

// One line per installed architecture.
const RPM_VERSION_FORMAT: &str = "%{VERSION}-%{RELEASE}\\n";

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn unsupported(family: PlatformFamily) -> anyhow::Error {
    anyhow::anyhow!(
        "No native package manager support for the {} platform family",
        family
    )
}

/// Query the installed version of one package.
pub fn installed_version_command(family: PlatformFamily, name: &str) -> Result<Vec<String>> {
    let mut cmd = match family {
        PlatformFamily::Debian => command(&["dpkg-query", "-W", "-f=${Status}\\t${Version}"]),
        PlatformFamily::Rhel | PlatformFamily::Amazon | PlatformFamily::Fedora => {
            command(&["rpm", "-q", "--qf", RPM_VERSION_FORMAT])
        }
        PlatformFamily::Arch => command(&["pacman", "-Q"]),
        PlatformFamily::Other => return Err(unsupported(family)),
    };
    cmd.push(name.to_string());
    Ok(cmd)
}

/// Parse the output of [`installed_version_command`]; `None` when not installed.
pub fn parse_installed_version(family: PlatformFamily, output: &str) -> Option<String> {
    let output = output.trim();
    let version = match family {
        PlatformFamily::Debian => {
            // "install ok installed\t3.5.2-2ubuntu0~16.04.4"
            let (status, version) = output.split_once('\t')?;
            if !status.ends_with(" installed") {
                return None;
            }
            version
        }
        PlatformFamily::Arch => output.split_whitespace().nth(1)?,
        _ => output.lines().last()?,
    };
    let version = version.trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Query the version the package manager would install for one package.
pub fn candidate_version_command(family: PlatformFamily, name: &str) -> Result<Vec<String>> {
    let mut cmd = match family {
        PlatformFamily::Debian => command(&["apt-cache", "policy"]),
        PlatformFamily::Rhel | PlatformFamily::Amazon => {
            command(&["repoquery", "--qf", RPM_VERSION_FORMAT])
        }
        PlatformFamily::Fedora => command(&[
            "dnf",
            "repoquery",
            "--latest-limit",
            "1",
            "--qf",
            RPM_VERSION_FORMAT,
        ]),
        PlatformFamily::Arch => command(&["pacman", "-Si"]),
        PlatformFamily::Other => return Err(unsupported(family)),
    };
    cmd.push(name.to_string());
    Ok(cmd)
}

/// Value of the first `key: value` line whose key is `key`.
fn field_value<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim() == key).then(|| value.trim())
    })
}

/// Parse the output of [`candidate_version_command`]; `None` when nothing is installable.
pub fn parse_candidate_version(family: PlatformFamily, output: &str) -> Option<String> {
    let version = match family {
        PlatformFamily::Debian => field_value(output, "Candidate")?,
        PlatformFamily::Arch => field_value(output, "Version")?,
        // repoquery lists oldest to newest
        _ => output.lines().map(str::trim).filter(|line| !line.is_empty()).last()?,
    };
    if version.is_empty() || version == "(none)" {
        return None;
    }
    Some(version.to_string())
}

/// Package argument with an optional version pin.
pub fn package_spec(family: PlatformFamily, name: &str, version: Option<&str>) -> String {
    match (family, version) {
        (PlatformFamily::Debian, Some(version)) => format!("{}={}", name, version),
        (PlatformFamily::Rhel | PlatformFamily::Amazon | PlatformFamily::Fedora, Some(version)) => {
            format!("{}-{}", name, version)
        }
        _ => name.to_string(),
    }
}

/// Command applying `action` to `packages`.
///
/// Upgrades use the install command: every supported tool installs the
/// newest candidate when no pin is given.
pub fn action_command(
    family: PlatformFamily,
    action: PackageAction,
    packages: &[(&str, Option<&str>)],
) -> Result<Vec<String>> {
    let mut cmd = match (family, action) {
        (PlatformFamily::Debian, PackageAction::Install | PackageAction::Upgrade) => {
            command(&["apt-get", "install", "-y"])
        }
        (PlatformFamily::Debian, PackageAction::Remove) => command(&["apt-get", "remove", "-y"]),
        (PlatformFamily::Debian, PackageAction::Purge) => command(&["apt-get", "purge", "-y"]),
        (PlatformFamily::Rhel | PlatformFamily::Amazon, action) if action.is_removal() => {
            command(&["yum", "remove", "-y"])
        }
        (PlatformFamily::Rhel | PlatformFamily::Amazon, _) => command(&["yum", "install", "-y"]),
        (PlatformFamily::Fedora, action) if action.is_removal() => command(&["dnf", "remove", "-y"]),
        (PlatformFamily::Fedora, _) => command(&["dnf", "install", "-y"]),
        (PlatformFamily::Arch, action) if action.is_removal() => {
            command(&["pacman", "-R", "--noconfirm"])
        }
        (PlatformFamily::Arch, _) => command(&["pacman", "-S", "--noconfirm", "--needed"]),
        (PlatformFamily::Other, _) => return Err(unsupported(family)),
    };

    for (name, version) in packages {
        if family == PlatformFamily::Arch && version.is_some() && !action.is_removal() {
            bail!("pacman cannot install a pinned version of {}", name);
        }
        let version = if action.is_removal() { None } else { *version };
        cmd.push(package_spec(family, name, version));
    }
    Ok(cmd)
}

/// Refresh the package metadata cache.
pub fn flush_cache_command(family: PlatformFamily) -> Result<Vec<String>> {
    match family {
        PlatformFamily::Debian => Ok(command(&["apt-get", "update"])),
        PlatformFamily::Rhel | PlatformFamily::Amazon => Ok(command(&["yum", "clean", "metadata"])),
        PlatformFamily::Fedora => Ok(command(&["dnf", "makecache"])),
        PlatformFamily::Arch => Ok(command(&["pacman", "-Sy"])),
        PlatformFamily::Other => Err(unsupported(family)),
    }
}

/// Commands for packages installed straight from an rpm URL.
pub fn source_query_command(name: &str) -> Vec<String> {
    command(&["rpm", "-q", name])
}

pub fn source_install_command(url: &str) -> Vec<String> {
    command(&["rpm", "-U", url])
}

pub fn source_remove_command(name: &str) -> Vec<String> {
    command(&["rpm", "-e", name])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_version_commands() {
        assert_eq!(
            installed_version_command(PlatformFamily::Debian, "python3.5").unwrap(),
            vec!["dpkg-query", "-W", "-f=${Status}\\t${Version}", "python3.5"]
        );
        assert_eq!(
            installed_version_command(PlatformFamily::Amazon, "python27").unwrap(),
            vec!["rpm", "-q", "--qf", "%{VERSION}-%{RELEASE}\\n", "python27"]
        );
        assert_eq!(
            installed_version_command(PlatformFamily::Arch, "python").unwrap(),
            vec!["pacman", "-Q", "python"]
        );
        assert!(installed_version_command(PlatformFamily::Other, "python").is_err());
    }

    #[test]
    fn test_parse_installed_version() {
        assert_eq!(
            parse_installed_version(PlatformFamily::Debian, "install ok installed\t3.5.2-2ubuntu0~16.04.4"),
            Some("3.5.2-2ubuntu0~16.04.4".to_string())
        );
        assert_eq!(
            parse_installed_version(PlatformFamily::Debian, "deinstall ok config-files\t3.5.2-2"),
            None
        );
        assert_eq!(
            parse_installed_version(PlatformFamily::Rhel, "2.7.5-58.el7\n"),
            Some("2.7.5-58.el7".to_string())
        );
        assert_eq!(
            parse_installed_version(PlatformFamily::Arch, "python 3.6.4-1\n"),
            Some("3.6.4-1".to_string())
        );
        assert_eq!(parse_installed_version(PlatformFamily::Arch, ""), None);
    }

    #[test]
    fn test_parse_installed_version_with_several_architectures() {
        // python-libs.x86_64 and python-libs.i686
        assert_eq!(
            parse_installed_version(PlatformFamily::Rhel, "2.7.5-58.el7\n2.7.5-58.el7\n"),
            Some("2.7.5-58.el7".to_string())
        );
    }

    #[test]
    fn test_candidate_version_commands() {
        assert_eq!(
            candidate_version_command(PlatformFamily::Debian, "ruby2.3").unwrap(),
            vec!["apt-cache", "policy", "ruby2.3"]
        );
        assert_eq!(
            candidate_version_command(PlatformFamily::Rhel, "ruby").unwrap()[0],
            "repoquery"
        );
        assert_eq!(
            candidate_version_command(PlatformFamily::Fedora, "ruby").unwrap()[..2],
            ["dnf", "repoquery"]
        );
    }

    #[test]
    fn test_parse_apt_policy() {
        let output = "\
python3.5:
  Installed: (none)
  Candidate: 3.5.2-2ubuntu0~16.04.4
  Version table:
     3.5.2-2ubuntu0~16.04.4 500
";
        assert_eq!(
            parse_candidate_version(PlatformFamily::Debian, output),
            Some("3.5.2-2ubuntu0~16.04.4".to_string())
        );

        let output = "python9:\n  Installed: (none)\n  Candidate: (none)\n";
        assert_eq!(parse_candidate_version(PlatformFamily::Debian, output), None);
        assert_eq!(parse_candidate_version(PlatformFamily::Debian, ""), None);
    }

    #[test]
    fn test_parse_repoquery_takes_newest() {
        let output = "2.0.0.648-30.el7\n2.0.0.648-33.el7_4\n\n";
        assert_eq!(
            parse_candidate_version(PlatformFamily::Rhel, output),
            Some("2.0.0.648-33.el7_4".to_string())
        );
        assert_eq!(parse_candidate_version(PlatformFamily::Fedora, "\n"), None);
    }

    #[test]
    fn test_parse_pacman_info() {
        let output = "Repository      : extra\nName            : python\nVersion         : 3.6.4-1\n";
        assert_eq!(
            parse_candidate_version(PlatformFamily::Arch, output),
            Some("3.6.4-1".to_string())
        );
    }

    #[test]
    fn test_action_commands_pin_versions() {
        let packages = [("python3.5", Some("3.5.2-1")), ("python3.5-dev", Some("3.5.2-1"))];
        assert_eq!(
            action_command(PlatformFamily::Debian, PackageAction::Install, &packages).unwrap(),
            vec!["apt-get", "install", "-y", "python3.5=3.5.2-1", "python3.5-dev=3.5.2-1"]
        );
        assert_eq!(
            action_command(PlatformFamily::Rhel, PackageAction::Upgrade, &[("ruby", Some("2.0.0.648"))]).unwrap(),
            vec!["yum", "install", "-y", "ruby-2.0.0.648"]
        );
        assert_eq!(
            action_command(PlatformFamily::Fedora, PackageAction::Install, &[("ruby", None)]).unwrap(),
            vec!["dnf", "install", "-y", "ruby"]
        );
    }

    #[test]
    fn test_removal_commands_drop_pins() {
        let packages = [("python3.5", Some("3.5.2-1"))];
        assert_eq!(
            action_command(PlatformFamily::Debian, PackageAction::Purge, &packages).unwrap(),
            vec!["apt-get", "purge", "-y", "python3.5"]
        );
        assert_eq!(
            action_command(PlatformFamily::Debian, PackageAction::Remove, &packages).unwrap(),
            vec!["apt-get", "remove", "-y", "python3.5"]
        );
        assert_eq!(
            action_command(PlatformFamily::Amazon, PackageAction::Remove, &packages).unwrap(),
            vec!["yum", "remove", "-y", "python3.5"]
        );
        assert_eq!(
            action_command(PlatformFamily::Arch, PackageAction::Remove, &packages).unwrap(),
            vec!["pacman", "-R", "--noconfirm", "python3.5"]
        );
    }

    #[test]
    fn test_pacman_rejects_pins() {
        assert_eq!(
            action_command(PlatformFamily::Arch, PackageAction::Install, &[("python", None)]).unwrap(),
            vec!["pacman", "-S", "--noconfirm", "--needed", "python"]
        );
        assert!(action_command(PlatformFamily::Arch, PackageAction::Install, &[("python", Some("3.6"))]).is_err());
    }

    #[test]
    fn test_unsupported_family() {
        let err = action_command(PlatformFamily::Other, PackageAction::Install, &[("python", None)]).unwrap_err();
        assert!(err.to_string().contains("other platform family"));
        assert!(flush_cache_command(PlatformFamily::Other).is_err());
    }

    #[test]
    fn test_flush_cache_commands() {
        assert_eq!(flush_cache_command(PlatformFamily::Debian).unwrap(), vec!["apt-get", "update"]);
        assert_eq!(flush_cache_command(PlatformFamily::Rhel).unwrap(), vec!["yum", "clean", "metadata"]);
        assert_eq!(flush_cache_command(PlatformFamily::Fedora).unwrap(), vec!["dnf", "makecache"]);
        assert_eq!(flush_cache_command(PlatformFamily::Arch).unwrap(), vec!["pacman", "-Sy"]);
    }
}
