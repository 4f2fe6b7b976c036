//! VCF input
//!
//! Minimal VCF reading for the annotation pipeline: header lines are
//! skipped, each data line yields one [`VariantRecord`] per alternate
//! allele, and FORMAT plus sample columns are carried through untouched.
//! Symbolic and spanning-deletion alternates (`<DEL>`, `*`) are skipped
//! because no lookup source can answer for them. Gzip-compressed files are
//! detected by their `.gz` extension.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::AnnotateError;
use crate::variant::{VariantKey, VariantRecord};

/// Open a text file for buffered line reading, decompressing `.gz` files
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>, AnnotateError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse one VCF data line into variant records, one per alternate allele
///
/// Multi-allelic sites split into one record per alternate; all of them
/// share the line's id, FORMAT, and sample columns.
pub fn parse_vcf_line(line: &str, line_num: usize) -> Result<Vec<VariantRecord>, AnnotateError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        return Err(AnnotateError::parse(
            line_num,
            format!("expected at least 5 fields, got {}", fields.len()),
        ));
    }

    let chrom = fields[0];
    let pos: u64 = fields[1].parse().map_err(|_| {
        AnnotateError::parse(line_num, format!("invalid position '{}'", fields[1]))
    })?;
    let id = if fields[2] == "." {
        None
    } else {
        Some(fields[2].to_string())
    };
    let reference = fields[3];

    let format = fields.get(8).map(|s| s.to_string());
    let samples: Vec<String> = fields.iter().skip(9).map(|s| s.to_string()).collect();

    let mut records = Vec::new();
    for alternate in fields[4].split(',') {
        if alternate == "*" || alternate.starts_with('<') {
            continue;
        }
        records.push(VariantRecord {
            key: VariantKey::new(chrom, pos, reference, alternate),
            id: id.clone(),
            format: format.clone(),
            samples: samples.clone(),
        });
    }

    Ok(records)
}

/// Read variant records from a VCF file (plain or gzip-compressed)
pub fn read_vcf(path: &Path) -> Result<Vec<VariantRecord>, AnnotateError> {
    read_vcf_from(open_reader(path)?)
}

/// Read variant records from any line source
pub fn read_vcf_from<R: BufRead>(reader: R) -> Result<Vec<VariantRecord>, AnnotateError> {
    let mut records = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        // Header lines and blank lines carry no variants
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        records.extend(parse_vcf_line(&line, line_idx + 1)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VCF: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878
chr1\t100\trs123\tA\tG\t50\tPASS\t.\tGT:DP\t0/1:30
chr2\t200\t.\tC\tT,CA\t.\tPASS\t.\tGT:DP\t1/2:22
";

    #[test]
    fn test_read_vcf_basic() {
        let records = read_vcf_from(VCF.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].key, VariantKey::new("chr1", 100, "A", "G"));
        assert_eq!(records[0].id.as_deref(), Some("rs123"));
        assert_eq!(records[0].format.as_deref(), Some("GT:DP"));
        assert_eq!(records[0].samples, vec!["0/1:30".to_string()]);
    }

    #[test]
    fn test_multiallelic_split() {
        let records = read_vcf_from(VCF.as_bytes()).unwrap();
        let chr2: Vec<_> = records.iter().filter(|r| r.key.chrom == "chr2").collect();
        assert_eq!(chr2.len(), 2);
        assert_eq!(chr2[0].key.alternate, "T");
        assert_eq!(chr2[1].key.alternate, "CA");
        // Missing id stays None
        assert!(chr2[0].id.is_none());
        // Both alternates carry the line's sample columns
        assert_eq!(chr2[0].samples, chr2[1].samples);
    }

    #[test]
    fn test_symbolic_alternates_skipped() {
        let records =
            parse_vcf_line("chr1\t100\t.\tA\t<DEL>,*,G\t.\t.\t.", 1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.alternate, "G");
    }

    #[test]
    fn test_short_line_rejected() {
        let err = read_vcf_from("chr1\t100\t.\tA\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AnnotateError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_bad_position_reports_line_number() {
        let input = "#header\nchr1\t100\t.\tA\tG\nchr1\toops\t.\tA\tG\n";
        let err = read_vcf_from(input.as_bytes()).unwrap_err();
        assert!(matches!(err, AnnotateError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_no_format_or_samples() {
        let records = parse_vcf_line("chr1\t100\t.\tA\tG", 1).unwrap();
        assert!(records[0].format.is_none());
        assert!(records[0].samples.is_empty());
    }

    #[test]
    fn test_gzip_round_trip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(VCF.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.vcf.gz");
        std::fs::write(&path, compressed).unwrap();

        let records = read_vcf(&path).unwrap();
        assert_eq!(records.len(), 3);
    }
}
