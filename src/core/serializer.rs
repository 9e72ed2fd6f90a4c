//! External representations of a materialized tree.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{CoreError, Node, NodeKind};

/// A utility struct for rendering and persisting trees.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeSerializer;

impl TreeSerializer {
    /// Encodes `tree` as JSON with the key order `name`, `path`, `type`, `children`.
    ///
    /// Pretty output uses two-space indentation.
    pub fn to_json(tree: &Node, pretty: bool) -> Result<Vec<u8>, CoreError> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(tree)?
        } else {
            serde_json::to_vec(tree)?
        };
        Ok(bytes)
    }

    /// Decodes a tree, rejecting files with children and directories without.
    pub fn from_json(bytes: &[u8]) -> Result<Node, CoreError> {
        let tree: Node = serde_json::from_slice(bytes)?;
        Self::check_shape(&tree)?;
        Ok(tree)
    }

    fn check_shape(node: &Node) -> Result<(), CoreError> {
        match (node.kind, &node.children) {
            (NodeKind::File, Some(_)) => Err(shape_error(format!(
                "file node {:?} must not have children",
                node.path
            ))),
            (NodeKind::Directory, None) => Err(shape_error(format!(
                "directory node {:?} is missing its children",
                node.path
            ))),
            _ => node.children().iter().try_for_each(Self::check_shape),
        }
    }

    /// Serializes `tree` and atomically replaces `dest` with it.
    ///
    /// The whole document is produced before the destination is touched, so a
    /// failure never leaves a partial file behind.
    pub fn write_json(tree: &Node, dest: &Path, pretty: bool) -> Result<(), CoreError> {
        let bytes = Self::to_json(tree, pretty)?;
        Self::write_atomic(&bytes, dest)
    }

    /// Writes `bytes` to a temporary sibling of `dest`, then renames it over `dest`.
    pub fn write_atomic(bytes: &[u8], dest: &Path) -> Result<(), CoreError> {
        let write_err = |e: std::io::Error| CoreError::Write(e, dest.to_path_buf());

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(write_err)?;
            tracing::info!("Created output directory: {:?}", parent);
        }

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        // Temporary files are created private; keep what the old file had,
        // or make a fresh one world-readable like a plain create would.
        match fs::metadata(dest) {
            Ok(existing) => {
                fs::set_permissions(tmp.path(), existing.permissions()).map_err(write_err)?
            }
            #[cfg(unix)]
            Err(_) => {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))
                    .map_err(write_err)?
            }
            #[cfg(not(unix))]
            Err(_) => {}
        }

        tmp.persist(dest).map_err(|e| write_err(e.error))?;
        tracing::info!("Saved tree ({} bytes) to {:?}", bytes.len(), dest);
        Ok(())
    }

    /// Renders `tree` as an indented text listing, in the tree's own order.
    pub fn render_ascii(tree: &Node) -> String {
        let mut result = String::new();
        result.push_str(&format!("{}/\n", tree.name));
        Self::render_children(tree.children(), &mut result, "");
        result
    }

    fn render_children(children: &[Node], result: &mut String, prefix: &str) {
        for (i, node) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;

            let connector = if is_last { "└── " } else { "├── " };
            let icon = if node.is_directory() { "📁 " } else { "📄 " };

            result.push_str(&format!("{prefix}{connector}{icon}{}\n", node.name));

            if !node.children().is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };

                Self::render_children(node.children(), result, &new_prefix);
            }
        }
    }
}

fn shape_error(msg: String) -> CoreError {
    CoreError::Json(<serde_json::Error as serde::de::Error>::custom(msg))
}
