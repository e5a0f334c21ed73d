//! In-memory zip packaging.
//!
//! Member layout:
//!
//! ```text
//! values.yaml
//! override.txt
//! Chart.yaml
//! templates/<basename>      one per file anywhere under templates/
//! ```
//!
//! Templates are flattened to their base name; nested sub-directories are not
//! preserved. Symlinked files are packed through their targets. Two templates with the same base name fail the build instead of
//! one silently replacing the other.

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{archive_err, ChartError};

/// Name of the override text member.
pub const OVERRIDE_MEMBER: &str = "override.txt";
/// Prefix of every template member.
pub const TEMPLATES_PREFIX: &str = "templates/";

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub body: Vec<u8>,
}

impl Member {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Collect every regular file under `dir` as a `templates/<basename>` member.
///
/// Walk order is sorted by file name at each level so the member order is
/// stable across filesystems. Symlinks are followed, matching what the
/// directory digest covers.
pub fn collect_templates(dir: &Path) -> Result<Vec<Member>, ChartError> {
    let mut members = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            archive_err(path, e)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let base = entry.file_name().to_string_lossy().into_owned();
        if !seen.insert(base.clone()) {
            return Err(archive_err(
                entry.path(),
                format!("template base name '{base}' is not unique under {}", dir.display()),
            ));
        }
        let body = std::fs::read(entry.path()).map_err(|e| archive_err(entry.path(), e))?;
        tracing::debug!("packing template {}", entry.path().display());
        members.push(Member::new(format!("{TEMPLATES_PREFIX}{base}"), body));
    }
    Ok(members)
}

/// Write `members` into a fresh zip held in memory.
///
/// Member timestamps are pinned to the zip epoch, so identical members yield
/// identical bytes. The buffer is only returned once the archive is complete.
pub fn pack(members: &[Member]) -> Result<Vec<u8>, ChartError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for member in members {
        writer
            .start_file(member.name.as_str(), options)
            .map_err(|e| archive_err(member_path(member), e))?;
        writer
            .write_all(&member.body)
            .map_err(|e| archive_err(member_path(member), e))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| archive_err(PathBuf::from("<archive>"), e))?;
    Ok(cursor.into_inner())
}

fn member_path(member: &Member) -> PathBuf {
    PathBuf::from(&member.name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn unpack(bytes: &[u8]) -> Vec<(String, String)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).unwrap();
            let mut body = String::new();
            file.read_to_string(&mut body).unwrap();
            out.push((file.name().to_string(), body));
        }
        out
    }

    #[test]
    fn pack_preserves_member_order_and_content() {
        let bytes = pack(&[
            Member::new("values.yaml", "replicas: 1\n"),
            Member::new(OVERRIDE_MEMBER, ""),
            Member::new("Chart.yaml", "name: demo\n"),
        ])
        .unwrap();
        let members = unpack(&bytes);
        let names: Vec<_> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["values.yaml", "override.txt", "Chart.yaml"]);
        assert_eq!(members[0].1, "replicas: 1\n");
        assert_eq!(members[1].1, "");
    }

    #[test]
    fn pack_is_byte_stable() {
        let members = [Member::new("a.txt", "a"), Member::new("b.txt", "b")];
        assert_eq!(pack(&members).unwrap(), pack(&members).unwrap());
    }

    #[test]
    fn templates_are_flattened_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("templates");
        fs::create_dir_all(dir.join("nested").join("deeper")).unwrap();
        fs::write(dir.join("service.yaml"), "kind: Service").unwrap();
        fs::write(dir.join("deployment.yaml"), "kind: Deployment").unwrap();
        fs::write(dir.join("nested").join("deeper").join("ingress.yaml"), "kind: Ingress").unwrap();

        let members = collect_templates(&dir).unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "templates/deployment.yaml",
                "templates/ingress.yaml",
                "templates/service.yaml"
            ]
        );
        assert!(names.iter().all(|n| n.matches('/').count() == 1));
    }

    #[test]
    fn duplicate_base_names_fail() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("templates");
        fs::create_dir_all(dir.join("a")).unwrap();
        fs::create_dir_all(dir.join("b")).unwrap();
        fs::write(dir.join("a").join("config.yaml"), "a").unwrap();
        fs::write(dir.join("b").join("config.yaml"), "b").unwrap();

        let err = collect_templates(&dir).unwrap_err();
        assert!(matches!(err, ChartError::Archive { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn empty_templates_dir_yields_no_members() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_templates(tmp.path()).unwrap().is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn symlinked_template_is_packed() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("shared.yaml"), "kind: ConfigMap").unwrap();

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("templates");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("svc.yaml"), "kind: Service").unwrap();
        std::os::unix::fs::symlink(outside.path().join("shared.yaml"), dir.join("shared.yaml"))
            .unwrap();

        let members = collect_templates(&dir).unwrap();
        assert_eq!(
            members,
            [
                Member::new("templates/shared.yaml", "kind: ConfigMap"),
                Member::new("templates/svc.yaml", "kind: Service"),
            ]
        );
    }

    #[test]
    #[cfg(unix)]
    fn dangling_template_link_is_archive_error() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("gone.yaml");
        std::os::unix::fs::symlink(tmp.path().join("missing.yaml"), &link).unwrap();
        let err = collect_templates(tmp.path()).unwrap_err();
        assert!(matches!(err, ChartError::Archive { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn unreadable_template_is_archive_error() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("secret.yaml");
        fs::write(&file, "x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();

        // Root can read regardless of mode bits; nothing to assert then.
        if fs::read(&file).is_ok() {
            return;
        }
        let err = collect_templates(tmp.path()).unwrap_err();
        assert!(matches!(err, ChartError::Archive { path, .. } if path == file));
    }
}
