use crate::basemap::{fetch_base_map, BaseMap};
use crate::carousel::{self, Carousel, CarouselLayout};
use crate::chrome::{BackToTop, ScrollSpy};
use crate::config::{AppConfig, LayoutConfig};
use crate::data::{self, Portfolio};
use crate::dotmap::{self, DotMap};
use crate::error::VizError;
use crate::graph::{self, GraphEvent, GraphView};
use crate::markers::Reconciliation;
use crate::page;
use crate::scatterplot::{self, ScatterEvent, ScatterPlot};
use crate::svg::Element;
use crate::symbolmap::{self, SymbolMap};
use crate::timeline::{self, Timeline};
use crate::treechart::{self, TreeChart};
use crate::types::{Responsive, Viewport};
use crate::{matrix, piechart};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Graph,
    Matrix,
    PieChart,
    ScatterPlot,
    Timeline,
    TreeChart,
    Carousel,
}

impl Chart {
    pub const ALL: [Chart; 7] = [
        Chart::Graph,
        Chart::Matrix,
        Chart::PieChart,
        Chart::ScatterPlot,
        Chart::Timeline,
        Chart::TreeChart,
        Chart::Carousel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Chart::Graph => "graph",
            Chart::Matrix => "matrix",
            Chart::PieChart => "piechart",
            Chart::ScatterPlot => "scatterplot",
            Chart::Timeline => "timeline",
            Chart::TreeChart => "treechart",
            Chart::Carousel => "carousel",
        }
    }

    pub fn container(self) -> &'static str {
        match self {
            Chart::Graph => graph::CONTAINER,
            Chart::Matrix => matrix::CONTAINER,
            Chart::PieChart => piechart::CONTAINER,
            Chart::ScatterPlot => scatterplot::CONTAINER,
            Chart::Timeline => timeline::CONTAINER,
            Chart::TreeChart => treechart::CONTAINER,
            Chart::Carousel => carousel::CONTAINER,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, VizError> {
        Chart::ALL
            .into_iter()
            .find(|chart| chart.name() == name)
            .ok_or_else(|| VizError::UnknownChart(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartOptions {
    pub width: Option<f64>,
    pub sort: Option<SortOrder>,
    pub highlight: Option<String>,
}

pub fn render_chart(
    chart: Chart,
    portfolio: &Portfolio,
    layout: &LayoutConfig,
    options: &ChartOptions,
) -> Result<Element, VizError> {
    let element = match chart {
        Chart::Graph => {
            let viewport = Viewport::new(layout.graph_width, layout.graph_height);
            let mut view = GraphView::new(&portfolio.skill_graph, viewport);
            if let Some(width) = options.width {
                if !view.resize(Viewport::new(width, layout.graph_height)) {
                    warn!("#{} cannot be drawn at width {}, keeping {}", chart.container(), width, layout.graph_width);
                }
            }
            if let Some(id) = &options.highlight {
                view.handle(GraphEvent::Hover(id.clone()))?;
            }
            view.render()
        }
        Chart::Matrix => matrix::render(&portfolio.courses),
        Chart::PieChart => piechart::render(&portfolio.time_allocation),
        Chart::ScatterPlot => {
            let mut plot = ScatterPlot::new(&portfolio.creative_works);
            if let Some(width) = options.width {
                if !plot.resize(Viewport::new(width, 0.0)) {
                    warn!("#{} cannot be drawn at width {}", chart.container(), width);
                }
            }
            match options.sort {
                Some(SortOrder::Asc) => plot.handle(ScatterEvent::SortAscending),
                Some(SortOrder::Desc) => plot.handle(ScatterEvent::SortDescending),
                None => {}
            }
            plot.render()
        }
        Chart::Timeline => {
            Timeline::new(&portfolio.career, options.width.unwrap_or(layout.timeline_width)).render()
        }
        Chart::TreeChart => TreeChart::new(&portfolio.skill_tree).render(),
        Chart::Carousel => Carousel::new(portfolio.gallery.clone(), CarouselLayout::default()).render(),
    };
    Ok(element)
}

pub async fn load_base_map(config: &AppConfig) -> Option<Arc<BaseMap>> {
    match fetch_base_map(&config.input.base_map_url, &config.input.base_map_object).await {
        Ok(map) => Some(Arc::new(map)),
        Err(e) => {
            error!("{}. Map components will show a fallback message.", e);
            None
        }
    }
}

pub fn build_page(
    template: &str,
    config: &AppConfig,
    portfolio: &Portfolio,
    base_map: Option<Arc<BaseMap>>,
) -> String {
    let mut fragments: Vec<(&'static str, String)> = Chart::ALL
        .par_iter()
        .filter_map(|&chart| {
            match render_chart(chart, portfolio, &config.layout, &ChartOptions::default()) {
                Ok(element) => Some((chart.container(), element.render())),
                Err(e) => {
                    warn!("Skipping {}: {}", chart.name(), e);
                    None
                }
            }
        })
        .collect();

    let dotmap = DotMap::new(
        &portfolio.travel,
        base_map.clone(),
        config.layout.dotmap_width,
        &mut rand::thread_rng(),
    );
    fragments.push((dotmap::CONTAINER, dotmap.render().render()));

    let symbolmap = SymbolMap::new(base_map, config.layout.symbolmap_width, config.symbol_map.clone());
    fragments.push((symbolmap::CONTAINER, symbolmap.render(&Reconciliation::default()).render()));

    let nav = ScrollSpy::new(page::nav_items(), page::unmeasured_sections());
    fragments.push((page::NAV_CONTAINER, nav.render().render()));
    let back_to_top = BackToTop::new(Some(page::ASSUMED_WINDOW_HEIGHT), page::ASSUMED_WINDOW_HEIGHT);
    fragments.push((page::BACK_TO_TOP_CONTAINER, back_to_top.render().render()));

    let mut html = template.replacen(
        "<body>",
        &format!("<body data-symbol-interval=\"{}\">", config.symbol_map.interval_ms),
        1,
    );
    for (container, fragment) in fragments {
        match page::insert_into_container(&html, container, &fragment) {
            Ok(updated) => html = updated,
            Err(e) => warn!("{}; component skipped", e),
        }
    }
    html
}

pub async fn generate_site(config: &AppConfig) -> Result<()> {
    let portfolio = data::load_portfolio(config)?;
    let template = page::load_template(config)?;
    let base_map = load_base_map(config).await;

    let html = build_page(&template, config, &portfolio, base_map);

    let site_dir = &config.output.site_dir;
    fs::create_dir_all(site_dir).context("Failed to create site directory")?;
    fs::write(site_dir.join("index.html"), html).context("Failed to write index.html")?;
    fs::write(site_dir.join("style.css"), page::STYLESHEET).context("Failed to write style.css")?;
    info!("Site written to {:?}", site_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::FALLBACK_MESSAGE;
    use crate::topology::tests::TWO_SQUARES;

    fn config(site_dir: &str) -> AppConfig {
        AppConfig::from_toml(&format!(
            "[output]\nsite_dir = \"{}\"\n\n[server]\nport = 0\n",
            site_dir
        ))
        .unwrap()
    }

    #[test]
    fn chart_names_round_trip() {
        for chart in Chart::ALL {
            assert_eq!(Chart::from_name(chart.name()).unwrap(), chart);
        }
        assert!(matches!(Chart::from_name("bar"), Err(VizError::UnknownChart(_))));
    }

    #[test]
    fn scatterplot_options_sort_and_resize() {
        let portfolio = Portfolio::default();
        let options = ChartOptions { width: Some(355.0), sort: Some(SortOrder::Desc), highlight: None };
        let svg = render_chart(Chart::ScatterPlot, &portfolio, &LayoutConfig::default(), &options).unwrap();
        assert_eq!(svg.get_attr("viewBox"), Some("0 0 355 450"));
        let labels: Vec<String> = svg.find_by_class("y")[0]
            .find_by_class("tick")
            .iter()
            .map(|t| t.text_content())
            .collect();
        assert_eq!(labels, ["paintings", "videos", "games"]);
    }

    #[test]
    fn unknown_highlight_is_reported() {
        let options = ChartOptions { highlight: Some("Nope".into()), ..Default::default() };
        let result = render_chart(Chart::Graph, &Portfolio::default(), &LayoutConfig::default(), &options);
        assert!(matches!(result, Err(VizError::UnknownNode(_))));
    }

    #[test]
    fn page_without_base_map_shows_fallback_only_for_maps() {
        let config = config("unused");
        let html = build_page(page::DEFAULT_TEMPLATE, &config, &Portfolio::default(), None);
        assert_eq!(html.matches(FALLBACK_MESSAGE).count(), 2);
        assert!(html.contains("class=\"highlight-one\""));
        assert!(html.contains("pie-arc"));
        assert!(html.contains("nav-item active"));
        assert!(html.contains("data-symbol-interval=\"2000\""));
    }

    #[test]
    fn missing_containers_are_skipped() {
        let config = config("unused");
        let map = BaseMap::from_topojson(TWO_SQUARES, "countries").unwrap();
        let template = "<html><body><div id=\"vis-matrix\"></div></body></html>";
        let html = build_page(template, &config, &Portfolio::default(), Some(Arc::new(map)));
        assert!(html.contains("<div id=\"vis-matrix\"><table>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn dataset_with_bad_travel_entries_still_builds_every_component() {
        let path = std::env::temp_dir().join(format!("portfolio-viz-data-{}.json", std::process::id()));
        let datasets = serde_json::json!({
            "travel": {
                "visits": [
                    {"name": "X", "country": "Y", "count": 1, "coords": [0.5, 0.5]},
                    {"name": "Nowhere", "country": "Y", "count": 2}
                ],
                "categories": []
            }
        });
        fs::write(&path, datasets.to_string()).unwrap();
        let mut config = config("unused");
        config.input.datasets = Some(path.clone());

        let portfolio = data::load_portfolio(&config).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(portfolio.travel.categories.is_empty());

        let map = BaseMap::from_topojson(TWO_SQUARES, "countries").unwrap();
        let html = build_page(page::DEFAULT_TEMPLATE, &config, &portfolio, Some(Arc::new(map)));
        assert_eq!(html.matches("class=\"d3-map-dot d3-map-category-tourism\"").count(), 1);
        assert!(!html.contains("Nowhere"));
        assert!(html.contains("pie-arc"));
        assert!(html.contains("class=\"highlight-one\""));
        assert!(html.contains("timeline-point-group"));
        assert!(html.contains("carousel-image"));
    }

    #[tokio::test]
    async fn generate_writes_site_files() {
        let dir = std::env::temp_dir().join(format!("portfolio-viz-{}", std::process::id()));
        let mut config = config(dir.to_str().unwrap());
        config.input.base_map_url = "http://127.0.0.1:9/countries.json".to_string();

        generate_site(&config).await.unwrap();

        let html = fs::read_to_string(dir.join("index.html")).unwrap();
        assert!(html.contains(FALLBACK_MESSAGE));
        assert!(html.contains("vis-treechart"));
        assert!(dir.join("style.css").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
