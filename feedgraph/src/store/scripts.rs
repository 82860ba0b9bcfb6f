use redis::Script;
use std::sync::LazyLock;

pub const DOCUMENT_INSERT_SCRIPT_BODY: &str = include_str!("../../lua/document_insert.lua");
pub const DOCUMENT_SWAP_SCRIPT_BODY: &str = include_str!("../../lua/document_swap.lua");
pub const DOCUMENT_DELETE_SCRIPT_BODY: &str = include_str!("../../lua/document_delete.lua");

pub static DOCUMENT_INSERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(DOCUMENT_INSERT_SCRIPT_BODY));
pub static DOCUMENT_SWAP_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(DOCUMENT_SWAP_SCRIPT_BODY));
pub static DOCUMENT_DELETE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(DOCUMENT_DELETE_SCRIPT_BODY));
