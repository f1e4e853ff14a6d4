//! Mapping decoder collaborator.
//!
//! The engine never parses VLQ itself. It consumes decoded mappings through
//! [`MappingDecoder`], whose tuples use 1-based lines and 0-based columns (the convention of the
//! common JavaScript consumers); the loader converts lines to 0-based before storing them.

use std::path::Path;

use crate::domain::errors::LoadError;

/// One decoded mapping, borrowed from the decoder's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMapping<'a> {
    pub source: Option<&'a str>,
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<&'a str>,
}

/// Delivers every mapping of a sourcemap to `callback`.
pub trait MappingDecoder: Sync {
    fn for_each_mapping(
        &self,
        path: &Path,
        text: &[u8],
        callback: &mut dyn FnMut(DecodedMapping<'_>),
    ) -> Result<(), LoadError>;
}

/// Decoder backed by the `sourcemap` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourcemapDecoder;

impl MappingDecoder for SourcemapDecoder {
    fn for_each_mapping(
        &self,
        path: &Path,
        text: &[u8],
        callback: &mut dyn FnMut(DecodedMapping<'_>),
    ) -> Result<(), LoadError> {
        let mut map = sourcemap::SourceMap::from_slice(text).map_err(|err| LoadError::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        // Sources are joined on the raw `sources` entry, never the `sourceRoot`-prefixed one.
        map.set_source_root(None::<&str>);

        for token in map.tokens() {
            if !token.has_source() {
                continue;
            }
            // The crate reports 0-based lines.
            callback(DecodedMapping {
                source: token.get_source(),
                generated_line: token.get_dst_line() + 1,
                generated_column: token.get_dst_col(),
                original_line: token.get_src_line() + 1,
                original_column: token.get_src_col(),
                name: token.get_name(),
            });
        }
        Ok(())
    }
}
