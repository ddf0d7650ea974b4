// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

/// Settings shared by every entry point that reads documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fail on keys that the schema does not know instead of skipping them.
    pub strict: bool,
    /// Give streams without a module or stream name a generated one,
    /// which is never written back out.
    pub autogen_module_name: bool,
}

impl ReadOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    pub fn with_autogen_module_name(mut self, autogen: bool) -> Self {
        self.autogen_module_name = autogen;
        self
    }
}
