//! Layer composition shared by the configuration tests.

use ortho_config::MergeComposer;
use serde_json::Value;

use crate::NookNoteConfig;

/// Configuration source, from lowest to highest precedence.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    Defaults,
    File,
    Environment,
    Cli,
}

/// Merges `(source, value)` layers in order into a [`NookNoteConfig`].
pub fn merged(layers: &[(Source, Value)]) -> NookNoteConfig {
    let mut composer = MergeComposer::new();
    for (source, value) in layers.iter().cloned() {
        match source {
            Source::Defaults => composer.push_defaults(value),
            Source::File => composer.push_file(value, None),
            Source::Environment => composer.push_environment(value),
            Source::Cli => composer.push_cli(value),
        }
    }
    NookNoteConfig::merge_from_layers(composer.layers()).expect("layers should merge")
}
