//! The `init` command.

use std::path::Path;

use crate::config::init_project;

pub fn run(output_dir: Option<&Path>) -> anyhow::Result<()> {
    init_project(output_dir)
}
