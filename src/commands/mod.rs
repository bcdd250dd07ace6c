//! CLI command implementations

mod ops;
mod wp;

pub use ops::{
    cmd_erase, cmd_extract, cmd_flash_name, cmd_flash_size, cmd_list_supported, cmd_read,
    cmd_verify, cmd_write,
};
pub use wp::{cmd_disable, cmd_enable, cmd_range, cmd_region, cmd_status as cmd_wp_status, cmd_list as cmd_wp_list};
