//! Compiled contract artifacts and library linking

use std::{collections::BTreeMap, fs, path::Path};

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use serde::Deserialize;

use crate::{
    constants::{HEX_PREFIX, NUM_BYTES_ADDRESS},
    errors::DeployError,
};

/// Addresses of deployed libraries, keyed by library name or by fully qualified
/// `<source>:<name>`
pub type Libraries = BTreeMap<String, Address>;

/// The placeholders in a contract's bytecode where library addresses must be linked,
/// keyed by library source and then by library name
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

/// The location of a single library placeholder within the bytecode
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct LinkOffset {
    /// The byte offset of the placeholder
    pub start: usize,
    /// The length of the placeholder in bytes
    pub length: usize,
}

/// A compiled contract, in the artifact format emitted by hardhat
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// The name of the contract
    pub contract_name: String,
    /// The source file declaring the contract
    pub source_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The hex-encoded creation bytecode, possibly containing library placeholders
    pub bytecode: String,
    /// The hex-encoded runtime bytecode
    #[serde(default)]
    pub deployed_bytecode: String,
    /// The library placeholders within `bytecode`
    #[serde(default)]
    pub link_references: LinkReferences,
}

impl Artifact {
    /// Load an artifact from a JSON file
    pub fn load(contract: &str, path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DeployError::artifact(contract, format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| DeployError::artifact(contract, format!("{}: {e}", path.display())))
    }

    /// The `<source>:<name>` identifier of the contract
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// The number of arguments the contract's constructor takes
    pub fn constructor_arity(&self) -> usize {
        self.abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.len())
            .unwrap_or_default()
    }

    /// The names of the libraries the bytecode must be linked against
    pub fn required_libraries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.link_references.iter().flat_map(|(source, libs)| {
            libs.keys().map(move |name| (source.as_str(), name.as_str()))
        })
    }

    /// The creation bytecode with every library placeholder replaced by the
    /// corresponding address from `libs`.
    ///
    /// Fails if the bytecode is empty (e.g. an interface or abstract contract) or if
    /// a library the bytecode references is missing from `libs`.
    pub fn linked_bytecode(&self, libs: &Libraries) -> Result<Bytes, DeployError> {
        let name = self.contract_name.as_str();
        let mut code = self
            .bytecode
            .strip_prefix(HEX_PREFIX)
            .unwrap_or(&self.bytecode)
            .to_string();
        if code.is_empty() {
            return Err(DeployError::artifact(name, "bytecode is empty"));
        }

        for (source, libs_in_source) in &self.link_references {
            for (lib, offsets) in libs_in_source {
                let address = libs
                    .get(&format!("{source}:{lib}"))
                    .or_else(|| libs.get(lib))
                    .ok_or_else(|| {
                        DeployError::artifact(name, format!("missing library `{lib}`"))
                    })?;
                let address_hex = hex::encode(address);

                for offset in offsets {
                    if offset.length != NUM_BYTES_ADDRESS {
                        return Err(DeployError::artifact(
                            name,
                            format!("placeholder for `{lib}` is {} bytes long", offset.length),
                        ));
                    }
                    let range = offset.start * 2..(offset.start + offset.length) * 2;
                    if range.end > code.len() {
                        return Err(DeployError::artifact(
                            name,
                            format!("placeholder for `{lib}` lies outside the bytecode"),
                        ));
                    }
                    code.replace_range(range, &address_hex);
                }
            }
        }

        hex::decode(&code)
            .map(Bytes::from)
            .map_err(|e| DeployError::artifact(name, format!("invalid bytecode: {e}")))
    }
}
