//! # Voxel Task System
//!
//! This module contains the tasks the world schedules on the generation
//! workers. They run in the background so that filling chunks never stalls the
//! update or render loops.

pub mod chunk_generation_task;
