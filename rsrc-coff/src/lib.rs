// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Build COFF object files embedding Windows resources.

This crate produces `.syso` object files that a linker merges into a
Windows executable. Two kinds of objects are supported:

* Resource objects carry a `.rsrc` section holding an application manifest,
  icons and version information. See [assemble_resources].
* Raw data objects carry a `.rdata` section holding an arbitrary file
  between two external symbols. See [package_raw_data].

Payloads are not loaded into memory. Objects refer to byte ranges of open
files and copy them to the destination when written with [Coff::write_to].

```no_run
use rsrc_coff::{assemble_resources, OpenedInputs, ResourceInputs};

let inputs = ResourceInputs {
    manifest: Some("app.manifest".into()),
    icons: vec!["app.ico".into()],
    version: None,
};

let opened = OpenedInputs::open(&inputs)?;
let (coff, _report) = assemble_resources(&opened, "amd64")?;

let mut fh = std::fs::File::create("rsrc.syso")?;
coff.write_to(&mut fh)?;
# Ok::<(), rsrc_coff::Error>(())
```
*/

pub mod assemble;
pub use assemble::{
    assemble_resources, package_raw_data, raw_data_accessor_template, raw_data_symbol,
    AssemblyReport, OpenedInputs, Registration, ResourceInputs,
};
pub mod coff;
pub use coff::{Architecture, Coff, ResourceData, ResourceSink, ResourceType};
mod error;
pub use error::{Error, Result};
pub mod group_icon;
pub use group_icon::{add_icon_group, IconGroup};
pub mod ico;
pub mod ids;
pub use ids::IdAllocator;
pub mod source;
pub use source::{SizedFile, SizedSource};
pub mod tree;
pub mod version_info;
pub use version_info::VersionInfo;
