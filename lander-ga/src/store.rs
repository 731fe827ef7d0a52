//! Policy persistence: a bare JSON array of the 54 table genes.

use crate::util::write_json_pretty;
use anyhow::{Context, Result};
use lander_core::Policy;
use std::fs;
use std::path::Path;

pub fn save_policy(path: &Path, policy: &Policy) -> Result<()> {
    write_json_pretty(path, policy)
}

pub fn load_policy(path: &Path) -> Result<Policy> {
    let data =
        fs::read(path).with_context(|| format!("failed reading policy {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("invalid policy {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_policy_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/best-policy.json");
        let policy = Policy::from_fn(|idx| (idx as f64 - 27.0) / 27.0);

        save_policy(&path, &policy).expect("save");
        assert_eq!(load_policy(&path).expect("load"), policy);
    }

    #[test]
    fn short_arrays_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("short.json");
        fs::write(&path, "[0.1, 0.2, 0.3]").expect("write");

        let err = load_policy(&path).expect_err("short policy must fail");
        assert!(format!("{err:#}").contains("expected 54 genes, got 3"));
        assert!(load_policy(&dir.path().join("missing.json")).is_err());
    }
}
