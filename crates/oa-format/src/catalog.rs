//! Per-interface format catalogs.
//!
//! A catalog maps `(generation, format_id)` to a [`FormatDescriptor`]. The
//! tables are data: the built-in ones are embedded YAML files, and callers
//! may load their own tables with the same schema (see [`schema`]).

use std::collections::BTreeMap;

use oa_errors::FormatError;
use tracing::debug;

use crate::descriptor::{CounterGroup, FormatDescriptor};
use crate::generation::{Generation, Interface};
use crate::header::HeaderWidth;

/// Built-in tables for the record-framed interface.
pub const LEGACY_FORMATS_YAML: &str = include_str!("formats/legacy.yaml");
/// Built-in tables for the raw report interface.
pub const OBSERVATION_FORMATS_YAML: &str = include_str!("formats/observation.yaml");

/// Serialized catalog schema.
pub mod schema {
    use serde::{Deserialize, Serialize};

    use crate::descriptor::UnitKind;
    use crate::generation::{Generation, Interface};

    /// A catalog file.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CatalogFile {
        /// Interface every table in the file belongs to.
        pub interface: Interface,
        /// Format tables, each shared by one or more generations.
        pub tables: Vec<FormatTable>,
    }

    /// Formats shared by a set of generations.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FormatTable {
        /// Generations using these layouts.
        pub generations: Vec<Generation>,
        /// Layouts keyed by their `id` field.
        pub formats: Vec<FormatEntry>,
    }

    /// One report layout.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FormatEntry {
        /// Format id, unique per generation
        pub id: u32,
        /// Layout name
        pub name: String,
        /// Report size in bytes
        pub size: usize,
        /// 64-bit timestamp and tick fields
        #[serde(default)]
        pub header_64bit: bool,
        /// Bytes before the first counter, when not implied by the header
        #[serde(default)]
        pub header_len: Option<usize>,
        /// Counter unit producing the reports
        #[serde(default)]
        pub unit: UnitKind,
        /// Split 40-bit A counters
        #[serde(default)]
        pub a40: Option<SplitEntry>,
        /// 64-bit A counters
        #[serde(default)]
        pub a64: Option<GroupEntry>,
        /// 32-bit A counters
        #[serde(default)]
        pub a32: Option<GroupEntry>,
        /// B counters
        #[serde(default)]
        pub b: Option<GroupEntry>,
        /// C counters
        #[serde(default)]
        pub c: Option<GroupEntry>,
    }

    /// A run of equally sized counters.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct GroupEntry {
        /// Byte offset of the first counter
        pub offset: usize,
        /// Number of counters
        pub count: usize,
        /// Logical index of the first counter
        #[serde(default)]
        pub first: u32,
    }

    /// Split 40-bit counters.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct SplitEntry {
        /// Byte offset of the low dwords
        pub low_offset: usize,
        /// Byte offset of the high bytes
        pub high_offset: usize,
        /// Number of counters
        pub count: usize,
        /// Logical index of the first counter
        #[serde(default)]
        pub first: u32,
    }
}

/// Immutable `(generation, format_id)` lookup for one interface.
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    interface: Interface,
    tables: BTreeMap<Generation, BTreeMap<u32, FormatDescriptor>>,
}

impl FormatCatalog {
    /// Load the built-in tables for an interface.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Catalog`] if the embedded data fails to parse
    /// and any descriptor validation error it contains.
    pub fn builtin(interface: Interface) -> Result<Self, FormatError> {
        let yaml = match interface {
            Interface::Legacy => LEGACY_FORMATS_YAML,
            Interface::Observation => OBSERVATION_FORMATS_YAML,
        };
        let catalog = Self::from_yaml_str(yaml)?;
        if catalog.interface != interface {
            return Err(FormatError::Catalog(format!(
                "embedded {interface} table declares interface {}",
                catalog.interface
            )));
        }
        Ok(catalog)
    }

    /// Parse a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Catalog`] on malformed input, duplicate ids
    /// or invalid layouts.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FormatError> {
        let file: schema::CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| FormatError::Catalog(e.to_string()))?;
        Self::from_schema(file)
    }

    /// Parse a JSON catalog.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Catalog`] on malformed input, duplicate ids
    /// or invalid layouts.
    pub fn from_json_str(json: &str) -> Result<Self, FormatError> {
        let file: schema::CatalogFile =
            serde_json::from_str(json).map_err(|e| FormatError::Catalog(e.to_string()))?;
        Self::from_schema(file)
    }

    /// Build a catalog from already validated descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Catalog`] if two descriptors share a
    /// `(generation, id)` key.
    pub fn from_descriptors(
        interface: Interface,
        descriptors: impl IntoIterator<Item = FormatDescriptor>,
    ) -> Result<Self, FormatError> {
        let mut tables: BTreeMap<Generation, BTreeMap<u32, FormatDescriptor>> = BTreeMap::new();
        for descriptor in descriptors {
            let generation = descriptor.generation();
            let id = descriptor.id();
            if tables
                .entry(generation)
                .or_default()
                .insert(id, descriptor)
                .is_some()
            {
                return Err(FormatError::Catalog(format!(
                    "duplicate format {id} for {generation}"
                )));
            }
        }
        Ok(Self { interface, tables })
    }

    fn from_schema(file: schema::CatalogFile) -> Result<Self, FormatError> {
        let mut descriptors = Vec::new();
        for table in &file.tables {
            for generation in &table.generations {
                for entry in &table.formats {
                    descriptors.push(descriptor_from_entry(*generation, entry)?);
                }
            }
        }
        let catalog = Self::from_descriptors(file.interface, descriptors)?;
        debug!(
            interface = %catalog.interface,
            generations = catalog.tables.len(),
            formats = catalog.len(),
            "Loaded OA format catalog"
        );
        Ok(catalog)
    }

    /// Look up the layout of `format_id` on `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidFormat`] for id 0, ids outside the
    /// generation's table, and ids with no layout on this generation.
    pub fn lookup(
        &self,
        generation: Generation,
        format_id: u32,
    ) -> Result<&FormatDescriptor, FormatError> {
        self.tables
            .get(&generation)
            .and_then(|table| table.get(&format_id))
            .ok_or_else(|| FormatError::invalid_format(generation.name(), format_id))
    }

    /// Interface the catalog describes.
    pub fn interface(&self) -> Interface {
        self.interface
    }

    /// Generations with at least one format.
    pub fn generations(&self) -> impl Iterator<Item = Generation> + '_ {
        self.tables.keys().copied()
    }

    /// Formats defined for a generation, by ascending id.
    pub fn formats(&self, generation: Generation) -> impl Iterator<Item = &FormatDescriptor> {
        self.tables
            .get(&generation)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    /// Total number of `(generation, format)` entries.
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// Whether the catalog holds no formats.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn descriptor_from_entry(
    generation: Generation,
    entry: &schema::FormatEntry,
) -> Result<FormatDescriptor, FormatError> {
    let header = if entry.header_64bit {
        HeaderWidth::Bits64
    } else {
        HeaderWidth::Bits32
    };
    let mut builder = FormatDescriptor::builder(generation, entry.id, &entry.name, entry.size)
        .header(header)
        .unit(entry.unit);
    if let Some(len) = entry.header_len {
        builder = builder.header_len(len);
    }
    if let Some(g) = entry.a40 {
        builder = builder.a40(g.low_offset, g.high_offset, g.count, g.first);
    }
    if let Some(g) = entry.a64 {
        builder = builder.a64(CounterGroup::new(g.offset, g.count).starting_at(g.first));
    }
    if let Some(g) = entry.a32 {
        builder = builder.a32(CounterGroup::new(g.offset, g.count).starting_at(g.first));
    }
    if let Some(g) = entry.b {
        builder = builder.b(g.offset, g.count);
    }
    if let Some(g) = entry.c {
        builder = builder.c(g.offset, g.count);
    }
    builder.build()
}
