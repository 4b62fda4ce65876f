use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::SessionCache;
use crate::output::{format_int, format_pct, format_value};
use crate::pipeline::{self, build_dashboard, Dashboard};
use crate::readers::{resolve_source, TableSource};
use crate::types::{
    Dataset, Dimension, FilterSelection, Metric, Scale, Selection, Series, ViewParams,
    DEFAULT_DATA_DIR, DEFAULT_EXPORT_NAME,
};

/// Health-plan beneficiary dashboard
#[derive(Parser, Debug)]
#[command(name = "benef-dashboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every dashboard view as JSON
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Metric feeding the aggregations
        #[arg(long, value_enum, default_value_t = Metric::Total)]
        metric: Metric,

        /// Display scale of the aggregated series
        #[arg(long, value_enum, default_value_t = Scale::Count)]
        scale: Scale,

        /// Output JSON file path (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write the filtered table as semicolon-delimited UTF-8
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file path
        #[arg(short, long, default_value = DEFAULT_EXPORT_NAME)]
        out: PathBuf,
    },

    /// Launch the GUI
    Gui {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the table is read from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Input file path (first CSV of the data directory if not specified)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory searched when no input is given
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,
}

impl SourceArgs {
    pub fn resolve(&self) -> crate::types::Result<TableSource> {
        resolve_source(self.input.as_deref(), &self.data_dir)
    }
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            input: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Categorical filters; a dimension given no values is unconstrained
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Region code (repeatable)
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Sex (repeatable)
    #[arg(long = "sex")]
    pub sexes: Vec<String>,

    /// Age band label (repeatable)
    #[arg(long = "age-band")]
    pub age_bands: Vec<String>,

    /// Municipality name (repeatable)
    #[arg(long = "municipality")]
    pub municipalities: Vec<String>,
}

impl FilterArgs {
    pub fn to_selection(&self) -> FilterSelection {
        FilterSelection {
            region: Selection::only(self.regions.iter().cloned()),
            sex: Selection::only(self.sexes.iter().cloned()),
            age_band: Selection::only(self.age_bands.iter().cloned()),
            municipality: Selection::only(self.municipalities.iter().cloned()),
        }
    }
}

/// GUI Application state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GuiState {
    #[default]
    Ready,
    Loaded,
    Error(String),
}

/// Dashboard tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    Region,
    AgeBand,
    Municipalities,
}

/// Multiselect over the values of one dimension, all checked by default
#[derive(Debug, Clone, Default)]
struct Picklist {
    options: Vec<String>,
    checked: Vec<bool>,
}

impl Picklist {
    fn new(options: Vec<String>, checked: bool) -> Self {
        let checked = vec![checked; options.len()];
        Self { options, checked }
    }

    /// Keep the checks of options that survive, uncheck new ones
    fn refresh(&mut self, options: Vec<String>) {
        let checked = options
            .iter()
            .map(|o| {
                self.options
                    .iter()
                    .position(|p| p == o)
                    .map(|i| self.checked[i])
                    .unwrap_or(false)
            })
            .collect();
        self.options = options;
        self.checked = checked;
    }

    fn selection(&self) -> Selection {
        Selection::only(
            self.options
                .iter()
                .zip(&self.checked)
                .filter(|(_, c)| **c)
                .map(|(o, _)| o.clone()),
        )
    }

    fn show(&mut self, ui: &mut egui::Ui, title: &str) -> bool {
        let mut changed = false;
        ui.collapsing(title, |ui| {
            ui.horizontal(|ui| {
                if ui.small_button("All").clicked() {
                    self.checked.iter_mut().for_each(|c| *c = true);
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    self.checked.iter_mut().for_each(|c| *c = false);
                    changed = true;
                }
            });
            egui::ScrollArea::vertical()
                .id_source(title)
                .max_height(160.0)
                .show(ui, |ui| {
                    for (option, checked) in self.options.iter().zip(self.checked.iter_mut()) {
                        changed |= ui.checkbox(checked, option.as_str()).changed();
                    }
                });
        });
        changed
    }
}

/// GUI Application
pub struct GuiApp {
    state: GuiState,
    cache: SessionCache,
    dataset: Option<Arc<Dataset>>,
    regions: Picklist,
    sexes: Picklist,
    age_bands: Picklist,
    municipalities: Picklist,
    metric: Metric,
    scale: Scale,
    tab: Tab,
    dashboard: Option<Dashboard>,
    message: Option<String>,
}

impl Default for GuiApp {
    fn default() -> Self {
        Self {
            state: GuiState::Ready,
            cache: SessionCache::new(),
            dataset: None,
            regions: Picklist::default(),
            sexes: Picklist::default(),
            age_bands: Picklist::default(),
            municipalities: Picklist::default(),
            metric: Metric::Total,
            scale: Scale::Count,
            tab: Tab::Region,
            dashboard: None,
            message: None,
        }
    }
}

impl GuiApp {
    /// Start with the given source, or the data directory fallback
    pub fn with_source(source: &SourceArgs) -> Self {
        let mut app = Self::default();
        match source.resolve() {
            Ok(table_source) => app.load(table_source),
            Err(e) => app.state = GuiState::Error(e.to_string()),
        }
        app
    }

    fn load(&mut self, source: TableSource) {
        match self.cache.load(&source) {
            Ok(dataset) => {
                let all = dataset.view();
                self.regions =
                    Picklist::new(pipeline::distinct_values(&all, Dimension::Region), true);
                self.sexes = Picklist::new(pipeline::distinct_values(&all, Dimension::Sex), true);
                self.age_bands =
                    Picklist::new(pipeline::distinct_values(&all, Dimension::AgeBand), true);
                self.municipalities = Picklist::default();
                self.dataset = Some(dataset);
                self.state = GuiState::Loaded;
                self.message = None;
                self.recompute();
            }
            Err(e) => {
                self.dataset = None;
                self.dashboard = None;
                self.state = GuiState::Error(e.to_string());
            }
        }
    }

    fn filters(&self) -> FilterSelection {
        FilterSelection {
            region: self.regions.selection(),
            sex: self.sexes.selection(),
            age_band: self.age_bands.selection(),
            municipality: self.municipalities.selection(),
        }
    }

    fn recompute(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };
        // Municipality options depend on the categorical filters only; checks
        // on municipalities no longer offered are dropped before building
        let options = pipeline::municipality_options(&dataset, &self.filters());
        self.municipalities.refresh(options);

        let params = ViewParams {
            filters: self.filters(),
            metric: self.metric,
            scale: self.scale,
        };
        self.dashboard = Some(build_dashboard(&dataset, &params));
    }

    fn save_export(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(DEFAULT_EXPORT_NAME)
            .save_file()
        else {
            return;
        };

        let filters = self.filters();
        let result = self
            .cache
            .export(&filters)
            .and_then(|bytes| Ok(std::fs::write(&path, bytes.as_slice())?));
        self.message = Some(match result {
            Ok(()) => format!("Filtered table saved to: {}", path.display()),
            Err(e) => format!("Failed to save filtered table: {}", e),
        });
    }

    fn show_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Data");
        if ui.button("Open CSV...").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("CSV", &["csv"])
                .pick_file()
            {
                self.load(TableSource::Path(path));
            }
        }
        if let Some(dataset) = &self.dataset {
            ui.label(format!(
                "{}: {} rows",
                dataset.source_name,
                format_int(dataset.len() as f64)
            ));
        }

        ui.separator();
        ui.heading("Filters");
        let mut changed = false;
        changed |= self.regions.show(ui, "Region");
        changed |= self.sexes.show(ui, "Sex");
        changed |= self.age_bands.show(ui, "Age band");
        changed |= self.municipalities.show(ui, "Municipality (optional)");

        ui.separator();
        ui.heading("Metric");
        for metric in Metric::ALL {
            changed |= ui
                .radio_value(&mut self.metric, metric, metric.label())
                .changed();
        }
        ui.heading("Scale");
        changed |= ui
            .radio_value(&mut self.scale, Scale::Count, "Count")
            .changed();
        changed |= ui
            .radio_value(&mut self.scale, Scale::Percent, "% of filtered total")
            .changed();

        if changed {
            self.recompute();
        }
    }

    fn show_dashboard(&mut self, ui: &mut egui::Ui) {
        let Some(dashboard) = self.dashboard.clone() else {
            return;
        };

        let kpis = &dashboard.kpis;
        ui.columns(4, |cols| {
            kpi_card(&mut cols[0], Metric::Total.label(), &format_int(kpis.total));
            kpi_card(&mut cols[1], Metric::Medical.label(), &format_int(kpis.medical));
            kpi_card(&mut cols[2], Metric::Dental.label(), &format_int(kpis.dental));
            kpi_card(
                &mut cols[3],
                "% Medical / % Dental",
                &format!("{} / {}", format_pct(kpis.pct_medical), format_pct(kpis.pct_dental)),
            );
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, Tab::Region, "By region");
            ui.selectable_value(&mut self.tab, Tab::AgeBand, "Age band");
            ui.selectable_value(&mut self.tab, Tab::Municipalities, "Municipalities");
        });

        let title = self.metric.label();
        match self.tab {
            Tab::Region => series_table(
                ui,
                "region",
                &format!("{} by region", title),
                dashboard.by_region.as_ref(),
                self.scale,
            ),
            Tab::AgeBand => series_table(
                ui,
                "age_band",
                &format!("{} by age band", title),
                dashboard.by_age_band.as_ref(),
                self.scale,
            ),
            Tab::Municipalities => {
                let focus = dashboard
                    .top_municipalities
                    .as_ref()
                    .and_then(|r| r.focus_period)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "all periods".to_string());
                series_table(
                    ui,
                    "municipality",
                    &format!("Top 20 municipalities: {} ({})", title, focus),
                    dashboard.top_municipalities.as_ref().map(|r| &r.entries),
                    self.scale,
                )
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.heading("Filtered data (sample)");
            if ui.button("Save filtered CSV...").clicked() {
                self.save_export();
            }
        });
        if let Some(message) = &self.message {
            ui.label(message.as_str());
        }
        ui.label(format!(
            "Showing {} of {} rows",
            format_int(dashboard.table.rows.len() as f64),
            format_int(dashboard.table.total_rows as f64)
        ));

        egui::ScrollArea::both()
            .id_source("table")
            .max_height(300.0)
            .show(ui, |ui| {
                egui::Grid::new("filtered_table").striped(true).show(ui, |ui| {
                    for column in &dashboard.table.columns {
                        ui.strong(column.as_str());
                    }
                    ui.end_row();
                    for row in &dashboard.table.rows {
                        for cell in row {
                            ui.label(cell.as_str());
                        }
                        ui.end_row();
                    }
                });
            });
    }
}

fn kpi_card(ui: &mut egui::Ui, label: &str, value: &str) {
    egui::Frame::none()
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(100)))
        .rounding(10.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.label(label);
            ui.heading(value);
        });
}

fn series_table(ui: &mut egui::Ui, id: &str, title: &str, series: Option<&Series>, scale: Scale) {
    ui.label(title);
    let Some(series) = series else {
        ui.label("Not available for this source");
        return;
    };

    let max = series
        .iter()
        .filter_map(|p| p.value)
        .fold(0.0_f64, f64::max);

    egui::ScrollArea::vertical()
        .id_source(id)
        .max_height(320.0)
        .show(ui, |ui| {
            egui::Grid::new(id).striped(true).show(ui, |ui| {
                for point in series {
                    ui.label(point.label.as_str());
                    let fraction = match point.value {
                        Some(v) if max > 0.0 => (v / max) as f32,
                        _ => 0.0,
                    };
                    ui.add(egui::ProgressBar::new(fraction).desired_width(240.0));
                    ui.label(format_value(point.value, scale));
                    ui.end_row();
                }
            });
        });
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        let dropped = ctx.input(|i| {
            i.raw.dropped_files.first().map(|f| match (&f.path, &f.bytes) {
                (Some(path), _) => TableSource::Path(path.clone()),
                (None, bytes) => TableSource::Bytes {
                    name: f.name.clone(),
                    bytes: bytes.as_ref().map(|b| b.to_vec()).unwrap_or_default(),
                },
            })
        });
        if let Some(source) = dropped {
            self.load(source);
        }

        egui::SidePanel::left("filters")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.show_sidebar(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Health-plan coverage");
            ui.add_space(10.0);

            match &self.state {
                GuiState::Ready => {
                    ui.label("Open or drop a semicolon-delimited CSV file");
                }
                GuiState::Loaded => {
                    egui::ScrollArea::vertical()
                        .id_source("dashboard")
                        .show(ui, |ui| self.show_dashboard(ui));
                }
                GuiState::Error(msg) => {
                    ui.colored_label(egui::Color32::RED, format!("Error: {}", msg));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_to_selection() {
        let args = FilterArgs {
            regions: vec!["SP".to_string()],
            ..FilterArgs::default()
        };
        let selection = args.to_selection();
        assert!(selection.region.allows("SP"));
        assert!(!selection.region.allows("RJ"));
        assert!(selection.sex.is_all());
        assert!(selection.municipality.is_all());
    }

    #[test]
    fn test_cli_parses_report() {
        let cli = Cli::try_parse_from([
            "benef-dashboard",
            "report",
            "--input",
            "data/x.csv",
            "--region",
            "SP",
            "--region",
            "RJ",
            "--metric",
            "dental",
            "--scale",
            "percent",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Report {
                source,
                filters,
                metric,
                scale,
                out,
            }) => {
                assert_eq!(source.input, Some(PathBuf::from("data/x.csv")));
                assert_eq!(source.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
                assert_eq!(filters.regions, vec!["SP", "RJ"]);
                assert_eq!(metric, Metric::Dental);
                assert_eq!(scale, Scale::Percent);
                assert!(out.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_export_default_out() {
        let cli = Cli::try_parse_from(["benef-dashboard", "export"]).unwrap();
        match cli.command {
            Some(Commands::Export { out, .. }) => {
                assert_eq!(out, PathBuf::from(DEFAULT_EXPORT_NAME))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_picklist_refresh_keeps_checks() {
        let mut picklist = Picklist::new(vec!["A".to_string(), "B".to_string()], true);
        picklist.checked[1] = false;
        picklist.refresh(vec!["B".to_string(), "A".to_string(), "C".to_string()]);
        assert_eq!(picklist.checked, vec![false, true, false]);
        assert_eq!(picklist.selection(), Selection::only(["A"]));
    }

    #[test]
    fn test_recompute_drops_stale_municipality_check() {
        let mut app = GuiApp::default();
        app.load(TableSource::Bytes {
            name: "upload.csv".to_string(),
            bytes: b"SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;Santos;10\nRJ;Niteroi;5\n".to_vec(),
        });
        assert_eq!(app.state, GuiState::Loaded);
        assert_eq!(app.municipalities.options, vec!["Niteroi", "Santos"]);

        app.municipalities.checked = vec![false, true];
        app.recompute();
        let dashboard = app.dashboard.as_ref().unwrap();
        assert_eq!(dashboard.table.total_rows, 1);
        assert_eq!(dashboard.kpis.total, 10.0);

        // Uncheck SP: Santos is no longer offered, so the municipality
        // selection falls back to unconstrained
        app.regions.checked = app.regions.options.iter().map(|r| r != "SP").collect();
        app.recompute();

        assert_eq!(app.municipalities.options, vec!["Niteroi"]);
        assert!(app.filters().municipality.is_all());
        let dashboard = app.dashboard.as_ref().unwrap();
        assert_eq!(dashboard.table.total_rows, 1);
        assert_eq!(dashboard.kpis.total, 5.0);
    }

    #[test]
    fn test_picklist_nothing_checked_is_unconstrained() {
        let picklist = Picklist::new(vec!["A".to_string()], false);
        assert!(picklist.selection().is_all());
    }
}
