// Copyright 2026 the nebula-br Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire types of the graph database's meta service, together with the client
//! for the subset of its RPCs that the backup tool drives.
//!
//! The message and client code in [`meta`] is kept in the exact shape
//! `prost-build`/`tonic-build` emit so that it stays interchangeable with the
//! server's IDL. The manifest file format is the plain prost encoding of
//! [`meta::BackupMeta`].

#[rustfmt::skip]
pub mod meta;
