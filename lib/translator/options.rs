use std::default;

/// Various options that can be passed to block assembly. Options will change
/// the IR produced for the same machine instructions.
#[derive(Clone, Debug, Default)]
pub struct Options {
    generate_pc_updates: bool,
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// Set the value of the, "Generate pc updates," option.
    pub fn set_generate_pc_updates(&mut self, generate_pc_updates: bool) {
        self.generate_pc_updates = generate_pc_updates;
    }

    /// Whether block assembly should emit `pc = address` before every
    /// instruction.
    ///
    /// Some architectures read the program counter in their semantics, and
    /// analyses of those need the value it holds while the instruction
    /// executes. By default no such updates are emitted.
    pub fn generate_pc_updates(&self) -> bool {
        self.generate_pc_updates
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `translator::Options`
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder for translation options.
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    /// Set the, "Generate pc updates," option. By default this is false.
    pub fn generate_pc_updates(mut self, generate_pc_updates: bool) -> OptionsBuilder {
        self.options.generate_pc_updates = generate_pc_updates;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl default::Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}
