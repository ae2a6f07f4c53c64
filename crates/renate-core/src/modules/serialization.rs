use crate::domain::{RenateError, RenateResult};
use crate::modules::coefficient_matrix::CoefficientMatrix;
use crate::modules::plasma::BeamletProfiles;
use std::fs;
use std::path::Path;

const COLUMN_WIDTH: usize = 16;
const COLUMN_PRECISION: usize = 8;

pub fn format_scientific_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$e}",
        width = width,
        precision = precision
    )
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Whitespace-separated table: grid position followed by every stored
/// profile column in name order. Column names are quoted in the header.
pub fn render_profile_table(profiles: &BeamletProfiles) -> String {
    let columns = profiles.columns();
    let mut output = String::new();

    output.push_str(&format!("{:>width$}", "\"z [m]\"", width = COLUMN_WIDTH));
    for name in columns.keys() {
        let quoted = format!("\"{}\"", name);
        output.push_str(&format!(" {:>width$}", quoted, width = COLUMN_WIDTH));
    }
    output.push('\n');

    for (step, position) in profiles.grid().iter().enumerate() {
        output.push_str(&format_scientific_f64(*position, COLUMN_WIDTH, COLUMN_PRECISION));
        for values in columns.values() {
            output.push(' ');
            output.push_str(&format_scientific_f64(values[step], COLUMN_WIDTH, COLUMN_PRECISION));
        }
        output.push('\n');
    }
    output
}

/// One block per grid step, rows `from`, columns `to`.
pub fn render_coefficient_matrix(matrix: &CoefficientMatrix) -> String {
    let mut output = String::new();
    for (step, slice) in matrix.matrix().iter().enumerate() {
        output.push_str(&format!("# step {}\n", step));
        for from in 0..slice.nrows() {
            let row: Vec<String> = (0..slice.ncols())
                .map(|to| format_scientific_f64(slice[(from, to)], COLUMN_WIDTH, COLUMN_PRECISION))
                .collect();
            output.push_str(&row.join(" "));
            output.push('\n');
        }
    }
    output
}

pub fn write_profile_table(path: &Path, profiles: &BeamletProfiles) -> RenateResult<()> {
    write_text_artifact(path, &render_profile_table(profiles)).map_err(|error| {
        RenateError::io_system(
            "IO.OUTPUT_WRITE",
            format!("failed to write profile table '{}': {}", path.display(), error),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{
        format_scientific_f64, normalize_text_artifact, render_profile_table, write_profile_table,
        write_text_artifact,
    };
    use crate::modules::plasma::{BeamletProfiles, ComponentProfile, PlasmaComponent, PlasmaComponents};
    use std::fs;
    use tempfile::TempDir;

    fn profiles() -> BeamletProfiles {
        let components =
            PlasmaComponents::new(vec![PlasmaComponent::electron()]).expect("electron only");
        let mut profiles = BeamletProfiles::new(
            vec![0.0, 0.5],
            components,
            vec![ComponentProfile {
                density: vec![1.0e19, 2.0e19],
                temperature: vec![100.0, 200.0],
            }],
        )
        .expect("profiles should validate");
        profiles
            .set_column("level 2", vec![0.0, 0.25])
            .expect("column");
        profiles
            .set_column("level 1", vec![1.0, 0.5])
            .expect("column");
        profiles
    }

    #[test]
    fn scientific_formatting_is_deterministic() {
        assert_eq!(format_scientific_f64(1.5, 12, 3), "     1.500e0");
        assert_eq!(format_scientific_f64(-2.5e-3, 12, 3), "   -2.500e-3");
    }

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        assert_eq!(normalize_text_artifact("alpha\r\nbeta\rgamma"), "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn profile_table_lists_columns_in_name_order() {
        let table = render_profile_table(&profiles());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split('"').filter(|part| !part.trim().is_empty()).collect();
        assert_eq!(header, ["z [m]", "level 1", "level 2"]);
        let last: Vec<f64> = lines[2]
            .split_whitespace()
            .map(|field| field.parse().expect("numeric field"))
            .collect();
        assert_eq!(last, [0.5, 0.5, 0.25]);
    }

    #[test]
    fn repeated_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("populations.dat");
        write_profile_table(&path, &profiles()).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");
        write_text_artifact(&path, &render_profile_table(&profiles()))
            .expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");
        assert_eq!(first, second);
    }
}
