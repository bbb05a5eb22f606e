use crate::error::MalformedCertification;
use anyhow::Context;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tnp_primitives::{LumiBlock, LumiRange, RunNumber};


/// Certified lumi ranges keyed by run, as declared by a certification ("golden") JSON.
pub type CertificationDocument = BTreeMap<RunNumber, Vec<LumiRange>>;


type RawDocument = BTreeMap<RunNumber, Vec<[i64; 2]>>;


pub fn parse_certification_document(json: &str) -> anyhow::Result<CertificationDocument> {
    let raw: RawDocument = serde_json::from_str(json)
        .context("failed to parse certification document")?;
    convert_raw_document(raw)
}


pub fn read_certification_document<R: Read>(reader: R) -> anyhow::Result<CertificationDocument> {
    let raw: RawDocument = serde_json::from_reader(reader)
        .context("failed to parse certification document")?;
    convert_raw_document(raw)
}


pub fn read_certification_file(path: impl AsRef<Path>) -> anyhow::Result<CertificationDocument> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| {
        format!("failed to open certification file {}", path.display())
    })?;
    read_certification_document(std::io::BufReader::new(file)).with_context(|| {
        format!("invalid certification file {}", path.display())
    })
}


pub fn certification_to_json(document: &CertificationDocument) -> anyhow::Result<String> {
    Ok(serde_json::to_string(document)?)
}


fn convert_raw_document(raw: RawDocument) -> anyhow::Result<CertificationDocument> {
    raw.into_iter().map(|(run, pairs)| {
        let ranges = pairs.into_iter()
            .map(|[first, last]| convert_pair(run, first, last))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((run, ranges))
    }).collect()
}


fn convert_pair(run: RunNumber, first: i64, last: i64) -> anyhow::Result<LumiRange> {
    let malformed = |reason: &str| MalformedCertification {
        run,
        first,
        last,
        reason: reason.to_string()
    };
    if first < 0 || last < 0 {
        return Err(malformed("has a negative lumi block").into())
    }
    if first > last {
        return Err(malformed("has its first lumi block after the last one").into())
    }
    let Ok(last_block) = LumiBlock::try_from(last) else {
        return Err(malformed("exceeds the maximal lumi block number").into())
    };
    Ok(LumiRange::new(first as LumiBlock, last_block))
}
