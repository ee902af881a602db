//
//  jamfpro
//  services/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Resource Services
//!
//! Per-resource CRUD services built on the shared transport. Each service
//! holds an [`Arc<JamfClient>`](crate::api::JamfClient) and a
//! [`CallOptions`](crate::api::CallOptions) fixing its wire format at
//! construction: Classic API services speak XML, Jamf Pro API services
//! speak JSON. The services contain no protocol logic of their own; they
//! build paths, pick bodies, and delegate.
//!
//! - [`printers`]: Classic API (XML) CRUD
//! - [`buildings`]: Jamf Pro API (JSON) CRUD, RSQL-filtered pagination,
//!   multi-delete
//! - [`icons`]: streamed multipart upload with progress, raw download

pub mod buildings;
pub mod icons;
pub mod printers;
