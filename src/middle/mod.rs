//! Middle-end module - IR, temporaries and lowering

pub mod ir;
pub mod ir_gen;
pub mod ir_printer;
pub mod temp_pool;
