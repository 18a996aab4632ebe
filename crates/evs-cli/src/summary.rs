use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use evs_config::{DatasetConfig, MeasurementConfig, VocabularyConfig};
use evs_schema::{DatasetSchema, FilterPredicate, SourceSchema};

pub fn print_schema_summary(schema: &DatasetSchema) {
    println!("Subject id column: {}", schema.subject_id_col());
    println!("{}", schema_table(schema));
    if !schema.warnings().is_empty() {
        eprintln!("Warnings:");
        for warning in schema.warnings() {
            eprintln!("- {warning}");
        }
    }
}

pub fn print_config_summary(config: &DatasetConfig) {
    println!("{}", config_table(config));
    let options = config.options();
    let thresholds = [
        ("min_valid_column_observations", options.min_valid_column_observations.as_ref().map(ToString::to_string)),
        (
            "min_valid_vocab_element_observations",
            options.min_valid_vocab_element_observations.as_ref().map(ToString::to_string),
        ),
        (
            "min_unique_numerical_observations",
            options.min_unique_numerical_observations.as_ref().map(ToString::to_string),
        ),
        (
            "min_true_float_frequency",
            options.min_true_float_frequency.map(|f| format!("{:.1}%", f * 100.0)),
        ),
    ];
    for (name, value) in thresholds {
        if let Some(value) = value {
            println!("{name}: {value}");
        }
    }
}

pub fn print_vocab_summary(config: &VocabularyConfig) {
    println!("{}", vocab_table(config));
    println!("Total vocabulary size: {}", config.total_vocab_size());
}

/// One row per source: the static source first, then dynamic sources in order.
pub fn schema_table(schema: &DatasetSchema) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Type"),
        header_cell("Event type"),
        header_cell("Columns to load"),
        header_cell("Filters"),
    ]);
    apply_table_style(&mut table);
    for source in std::iter::once(schema.static_schema()).chain(schema.dynamic()) {
        table.add_row(vec![
            Cell::new(source.input_df())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(source.source_type()),
            event_type_cell(source),
            Cell::new(
                source
                    .columns_to_load()
                    .iter()
                    .map(|(column, dtype)| format!("{column}: {dtype}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            filter_cell(source),
        ]);
    }
    table
}

pub fn config_table(config: &DatasetConfig) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Measurement"),
        header_cell("Temporality"),
        header_cell("Modality"),
        header_cell("Observed"),
        header_cell("Vocabulary"),
        header_cell("Values column"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (name, measurement) in config.measurement_configs() {
        table.add_row(measurement_row(name, measurement));
    }
    table
}

fn measurement_row(name: &str, measurement: &MeasurementConfig) -> Vec<Cell> {
    let name_cell = if measurement.is_dropped() {
        dim_cell(name)
    } else {
        Cell::new(name).add_attribute(Attribute::Bold)
    };
    vec![
        name_cell,
        Cell::new(measurement.temporality()),
        Cell::new(measurement.modality()),
        measurement
            .observation_frequency()
            .map_or_else(|| dim_cell("-"), |f| Cell::new(format!("{:.1}%", f * 100.0))),
        measurement
            .vocabulary()
            .map_or_else(|| dim_cell("-"), |vocab| Cell::new(vocab.len())),
        measurement
            .values_column()
            .map_or_else(|| dim_cell("-"), Cell::new),
    ]
}

pub fn vocab_table(config: &VocabularyConfig) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Measurement"),
        header_cell("Offset"),
        header_cell("Size"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);

    let mut rows: Vec<(&String, usize)> = config
        .vocab_offsets_by_measurement
        .iter()
        .map(|(name, offset)| (name, *offset))
        .collect();
    rows.sort_by_key(|(name, offset)| (*offset, *name));
    for (name, offset) in rows {
        let size = config
            .vocab_sizes_by_measurement
            .get(name)
            .copied()
            .unwrap_or(1);
        table.add_row(vec![Cell::new(name), Cell::new(offset), Cell::new(size)]);
    }
    table
}

fn event_type_cell(source: &SourceSchema) -> Cell {
    match source.event_type() {
        Some(event_type) => Cell::new(event_type.labels().join("\n")),
        None => dim_cell("-"),
    }
}

fn filter_cell(source: &SourceSchema) -> Cell {
    let filters = source.filter_on();
    if filters.is_empty() {
        return dim_cell("-");
    }
    let lines: Vec<String> = filters
        .into_iter()
        .map(|(column, predicate)| match predicate {
            FilterPredicate::NonNull => format!("{column} not null"),
            FilterPredicate::OneOf(values) => format!(
                "{column} in [{}]",
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
        .collect();
    Cell::new(lines.join("\n"))
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
