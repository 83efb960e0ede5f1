use std::path::Path;

use super::{Platform, trim_trailing_separators};

/// Linux, macOS and the BSDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Posix;

impl Platform for Posix {
    fn name(&self) -> &'static str {
        "posix"
    }

    /// Replaces `/`, `.` and `-` with `_`. Nothing else is touched, so two
    /// paths such as `/a-b` and `/a_b` end up with the same token.
    fn sanitize(&self, raw_path: &str) -> String {
        raw_path.replace(['/', '.', '-'], "_")
    }

    fn is_root_mount(&self, mount_point: &Path) -> bool {
        mount_point
            .to_str()
            .map(|p| trim_trailing_separators(p) == "/")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators_dots_and_dashes() {
        let p = Posix;
        assert_eq!(p.sanitize("/"), "_");
        assert_eq!(p.sanitize("/boot/efi"), "_boot_efi");
        assert_eq!(p.sanitize("/mnt/my-disk.1"), "_mnt_my_disk_1");
        assert_eq!(p.sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let p = Posix;
        for raw in ["/", "/var/lib/docker", "/run/user/1000", "/media/usb-stick.v2"] {
            let once = p.sanitize(raw);
            assert_eq!(p.sanitize(&once), once);
        }
    }

    #[test]
    fn sanitize_output_is_metric_safe_for_path_alphabet() {
        let p = Posix;
        let token = p.sanitize("/srv/Data-01/backups.old/x");
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn colliding_paths_share_a_token() {
        let p = Posix;
        assert_eq!(p.sanitize("/a-b"), p.sanitize("/a_b"));
        assert_eq!(p.sanitize("/a.b"), p.sanitize("/a/b"));
    }

    #[test]
    fn root_detection() {
        let p = Posix;
        assert!(p.is_root_mount(Path::new("/")));
        assert!(!p.is_root_mount(Path::new("/data")));
        assert!(!p.is_root_mount(Path::new("/boot/")));
    }
}
