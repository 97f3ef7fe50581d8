//! runs K fully independent solver instances, each with its own output
//! directory, checkpoint lineage, and atomically-renamed progress file.
//! Instances never share stores; aggregating their blueprints afterward is
//! out of scope here.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Child, Command};

#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub instance_count: usize,
    pub base_output_dir: PathBuf,
    pub trainer_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub instance_id: usize,
    pub iteration: u64,
    pub infoset_count: usize,
}

fn instance_dir(base: &PathBuf, instance_id: usize) -> PathBuf {
    base.join(format!("instance-{instance_id}"))
}

fn write_progress(dir: &PathBuf, progress: &Progress) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let bytes = serde_json::to_vec_pretty(progress).expect("progress serializes");
    let tmp = dir.join("progress.json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(tmp, dir.join("progress.json"))?;
    Ok(())
}

/// launches `config.instance_count` independent trainer processes, each
/// writing into its own `instance-<n>/` subdirectory, and returns the
/// spawned children for the caller to supervise or wait on.
pub fn launch(config: &InstanceConfig) -> Result<Vec<(usize, Child)>> {
    let trainer_exe = crate::sibling_binary("trainer")?;
    let mut children = Vec::with_capacity(config.instance_count);
    for instance_id in 0..config.instance_count {
        let dir = instance_dir(&config.base_output_dir, instance_id);
        std::fs::create_dir_all(&dir)?;
        write_progress(&dir, &Progress { instance_id, iteration: 0, infoset_count: 0 })?;
        let child = Command::new(&trainer_exe)
            .args(&config.trainer_args)
            .arg("--output-dir").arg(&dir)
            .arg("--seed").arg(instance_id.to_string())
            .spawn()?;
        log::info!(target: "coordinator::multi_instance", "launched instance {instance_id} in {}", dir.display());
        children.push((instance_id, child));
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_directories_are_disjoint() {
        let base = PathBuf::from("/tmp/holdem-solver-multi");
        assert_ne!(instance_dir(&base, 0), instance_dir(&base, 1));
    }
}
