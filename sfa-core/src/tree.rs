use crate::{
    error::TableError,
    table::{csv_reader, Columns},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io::Read};

const TREES_TABLE: &str = "trees";

/// Site metadata for a tapped tree.
///
/// Weekly production rows are joined with this table by tree, and the site
/// and species filters match against it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TreeInfo {
    /// Tree identifier as used in the sap table (e.g., "A1")
    pub tree_id: String,
    /// Collection site, upper-cased on load (e.g., "HF")
    pub site: String,
    /// Species code (e.g., "ACSA" for sugar maple)
    pub species: String,
}

/// Tree metadata keyed by upper-cased tree id.
pub type TreeIndex = HashMap<String, TreeInfo>;

impl TreeInfo {
    /// Parse a CSV string of tree metadata.
    ///
    /// Expected CSV columns: tree_id, site, species
    pub fn parse_csv(csv_data: &str) -> Result<Vec<TreeInfo>, TableError> {
        Self::from_reader(csv_data.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<TreeInfo>, TableError> {
        let mut rdr = csv_reader(reader);
        let columns = Columns::locate(TREES_TABLE, rdr.headers()?, &["tree_id", "site"], &["species"])?;
        let mut tree_list = Vec::new();
        for row in rdr.records() {
            let record = row?;
            tree_list.push(TreeInfo {
                tree_id: columns.text(&record, "tree_id").to_string(),
                site: columns.text(&record, "site").to_uppercase(),
                species: columns.text(&record, "species").to_string(),
            });
        }
        Ok(tree_list)
    }

    /// Index trees by upper-cased id. Later duplicates replace earlier ones.
    pub fn index(trees: Vec<TreeInfo>) -> TreeIndex {
        trees
            .into_iter()
            .map(|tree| (tree.tree_id.to_uppercase(), tree))
            .collect()
    }

    /// Look up a tree by id, ignoring case.
    pub fn lookup<'a>(index: &'a TreeIndex, tree_id: &str) -> Option<&'a TreeInfo> {
        index.get(&tree_id.to_uppercase())
    }
}
