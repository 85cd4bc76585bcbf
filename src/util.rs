// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::cmp::Ordering;
use std::path::{Component, Path};

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Turns a display name into a directory name: anything other than ASCII
/// letters, digits and spaces is dropped, and runs of whitespace become a
/// single underscore.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let sanitized = kept.split_whitespace().collect::<Vec<&str>>().join("_");
    if sanitized.is_empty() {
        "Unnamed".to_string()
    } else {
        sanitized
    }
}

/// Joins the normal components of a relative path with forward slashes.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Returns the forward-slash path of `target` as seen from the directory
/// `from_dir`. Both paths must be relative to the same root.
pub fn relative_path(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component> = from_dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let to: Vec<Component> = target
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat("..".to_string()).take(from.len() - common));
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Orders strings the way a human-facing listing would: case-insensitively,
/// with the raw strings as a tie breaker so the order stays total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
