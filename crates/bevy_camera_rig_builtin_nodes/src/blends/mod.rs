//! Blend nodes, used to transition between camera rigs on a blend stack.

pub mod curve_blend_node;
pub mod pop_blend_node;
pub mod simple_fixed_time_blend_node;
