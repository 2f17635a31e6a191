//! Built-in catalog for variation-graph indexes and the default target sets
//! the common mapping pipelines request.

use crate::catalog::{parse_catalog, Catalog};

/// Catalog describing the standard variation-graph index build: graph
/// construction from FASTA+VCF or GFA, XG, GBWT, pruning (topological or
/// haplotype-aware), and GCSA/LCP indexing.
pub const VG_CATALOG_YAML: &str = r#"version: "1.0"
name: vg-indexes
description: "Variation-graph index construction"

artifacts:
  ref-fasta:
    suffix: fasta
  vcf:
    suffix: vcf
  phased-vcf:
    suffix: phased.vcf
  insertions-fasta:
    suffix: insertions.fasta
  ref-gfa:
    suffix: gfa
  varpaths-vg:
    suffix: varpaths.vg
  vg:
    suffix: vg
  xg:
    suffix: xg
  gbwt:
    suffix: gbwt
  node-mapping:
    suffix: mapping
  pruned-vg:
    suffix: pruned.vg
  haplo-pruned-vg:
    suffix: haplopruned.vg
  gcsa-lcp:
    suffix: gcsa

recipes:
  # Alias a phased VCF as an unphased one
  - output: vcf
    inputs: [phased-vcf]
    command: "true"
    outputs: ["{{inputs.0}}"]

  # Strip variant paths from a graph that has them
  - output: vg
    inputs: [varpaths-vg]
    command: "vg paths -x {{inputs.0}} -d > {{output}}"

  # Construct from GFA
  - output: vg
    inputs: [ref-gfa]
    command: "vg convert -g {{inputs.0}} > {{output}}"

  # Construct from FASTA and VCF, with and without insertions
  - output: vg
    inputs: [ref-fasta, vcf, insertions-fasta]
    command: "vg construct -r {{inputs.0}} -v {{inputs.1}} -I {{inputs.2}} > {{output}}"
  - output: vg
    inputs: [ref-fasta, vcf]
    command: "vg construct -r {{inputs.0}} -v {{inputs.1}} > {{output}}"

  # Same constructions, keeping variant paths for GBWT building
  - output: varpaths-vg
    inputs: [ref-fasta, phased-vcf, insertions-fasta]
    command: "vg construct -a -r {{inputs.0}} -v {{inputs.1}} -I {{inputs.2}} > {{output}}"
  - output: varpaths-vg
    inputs: [ref-fasta, phased-vcf]
    command: "vg construct -a -r {{inputs.0}} -v {{inputs.1}} > {{output}}"

  - output: xg
    inputs: [ref-gfa]
    command: "vg index -x {{output}} {{inputs.0}}"
  - output: xg
    inputs: [vg]
    command: "vg index -x {{output}} {{inputs.0}}"

  - output: node-mapping
    inputs: [vg]
    command: "vg ids -m {{output}} {{inputs.0}}"

  - output: gbwt
    inputs: [varpaths-vg, phased-vcf]
    command: "vg gbwt -x {{inputs.0}} -v {{inputs.1}} -o {{output}}"

  - output: pruned-vg
    inputs: [vg, xg]
    command: "vg prune {{inputs.0}} > {{output}}"

  - output: haplo-pruned-vg
    inputs: [vg, xg, gbwt, node-mapping]
    command: "vg prune -u -g {{inputs.2}} -m {{output}}.mapping {{inputs.0}} > {{output}}"
    outputs: ["{{output}}", "{{output}}.mapping"]

  - output: gcsa-lcp
    inputs: [haplo-pruned-vg]
    command: "vg index -g {{output}} {{inputs.0}}"
    outputs: ["{{output}}", "{{output}}.lcp"]
  - output: gcsa-lcp
    inputs: [pruned-vg]
    command: "vg index -g {{output}} {{inputs.0}}"
    outputs: ["{{output}}", "{{output}}.lcp"]

targets: [xg, gcsa-lcp]
"#;

/// Parse the built-in variation-graph catalog.
pub fn vg_catalog() -> Result<Catalog, String> {
    parse_catalog(VG_CATALOG_YAML)
}

/// Indexes the short-read mapper needs.
pub fn default_map_targets() -> Vec<String> {
    vec!["xg".to_string(), "gcsa-lcp".to_string()]
}

/// Indexes the multipath mapper needs. Several of these artifacts are not
/// registered in the built-in catalog; planning for them errors with an
/// unknown-identifier diagnostic rather than failing at list definition.
pub fn default_mpmap_targets() -> Vec<String> {
    vec![
        "spliced-xg".to_string(),
        "spliced-distance".to_string(),
        "spliced-gcsa-lcp".to_string(),
        "haplotype-transcript-gbwt".to_string(),
    ]
}

/// Indexes the haplotype-aware mapper needs. As with the multipath set, the
/// unregistered names surface at planning time.
pub fn default_giraffe_targets() -> Vec<String> {
    vec![
        "gbwt".to_string(),
        "gbwt-graph".to_string(),
        "distance".to_string(),
        "minimizer".to_string(),
    ]
}
