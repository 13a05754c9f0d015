pub mod terraform;

pub use terraform::TerraformCli;
