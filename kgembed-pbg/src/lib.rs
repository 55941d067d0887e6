// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! PyTorch-BigGraph backend for the kgembed pipeline
//!
//! Drives `torchbiggraph_import_from_tsv`, `torchbiggraph_train` and
//! `torchbiggraph_export_to_tsv` as child processes, feeding them a config
//! module generated from [`kgembed_core::PbgConfig`].

pub mod backend;
pub mod config_file;
pub mod toolchain;

pub use backend::PbgBackend;
pub use config_file::{write_config, CONFIG_JSON, CONFIG_MODULE};
pub use toolchain::{PbgToolchain, Tool, DUPLICATE_OPENMP_VAR};
