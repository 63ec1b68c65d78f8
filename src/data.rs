use crate::config::AppConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub travel: TravelData,
    pub skill_graph: SkillGraph,
    pub courses: CourseMatrix,
    pub time_allocation: Vec<Slice>,
    pub creative_works: Vec<CreativeWork>,
    pub career: Vec<TimelineEntry>,
    pub skill_tree: TreeNode,
    pub gallery: Vec<GalleryImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelData {
    pub visits: Vec<Visit>,
    pub categories: Vec<PurposeCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub name: String,
    pub country: String,
    pub count: u32,
    #[serde(default)]
    pub coords: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurposeCategory {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<String>,
    pub color: String,
    pub class_name: String,
    #[serde(default)]
    pub fallback: bool,
}

impl PurposeCategory {
    pub fn tourism() -> Self {
        Self {
            name: "Tourism".to_string(),
            locations: Vec::new(),
            color: "#e67e22".to_string(),
            class_name: "d3-map-category-tourism".to_string(),
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub group: u8,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMatrix {
    pub headers: Vec<String>,
    pub rows: Vec<MatrixRow>,
    pub header_colors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRow {
    pub label: String,
    pub values: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slice {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeWork {
    pub year: i32,
    pub kind: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: i32,
    pub company_role: String,
    pub description: String,
    pub image: String,
    pub year_position: Placement,
    pub description_position: Placement,
    pub image_position: Placement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(name: &str) -> Self {
        Self { name: name.to_string(), children: Vec::new() }
    }

    fn branch(name: &str, children: Vec<TreeNode>) -> Self {
        Self { name: name.to_string(), children }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

pub fn load_portfolio(config: &AppConfig) -> Result<Portfolio> {
    match &config.input.datasets {
        Some(path) => {
            info!("Loading datasets from {:?}", path);
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read datasets file: {:?}", path))?;
            let portfolio: Portfolio = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse datasets file: {:?}", path))?;
            Ok(portfolio)
        }
        None => Ok(Portfolio::default()),
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            travel: TravelData::default(),
            skill_graph: SkillGraph::default(),
            courses: CourseMatrix::default(),
            time_allocation: default_time_allocation(),
            creative_works: default_creative_works(),
            career: default_career(),
            skill_tree: default_skill_tree(),
            gallery: default_gallery(),
        }
    }
}

fn visit(name: &str, country: &str, count: u32, lon: f64, lat: f64) -> Visit {
    Visit {
        name: name.to_string(),
        country: country.to_string(),
        count,
        coords: Some([lon, lat]),
    }
}

impl Default for TravelData {
    fn default() -> Self {
        let visits = vec![
            visit("Shanghai", "China", 20, 121.4737, 31.2304),
            visit("Jiangsu", "China", 10, 119.78, 32.97),
            visit("Zhejiang", "China", 3, 120.0667, 29.1833),
            visit("Qinghai", "China", 1, 96.2267, 35.8617),
            visit("Yunnan", "China", 3, 101.6, 24.9667),
            visit("Hainan", "China", 1, 109.7333, 19.125),
            visit("Hunan", "China", 15, 111.99, 27.61),
            visit("Guangzhou", "China", 10, 113.2644, 23.1291),
            visit("Taiwan", "China", 1, 120.9605, 23.6978),
            visit("Hong Kong", "China", 10, 114.1694, 22.3193),
            visit("Osaka", "Japan", 2, 135.5022, 34.6937),
            visit("Kyoto", "Japan", 2, 135.7681, 35.0116),
            visit("Tokyo", "Japan", 6, 139.6503, 35.6762),
            visit("Seoul", "South Korea", 4, 126.978, 37.5665),
            visit("Minnesota", "United States", 1, -94.6362, 46.3924),
            visit("New York", "United States", 1, -74.006, 40.7128),
            visit("Boston", "United States", 1, -71.0589, 42.3601),
            visit("Phuket", "Thailand", 1, 98.3923, 7.8804),
            visit("Bangkok", "Thailand", 1, 100.5018, 13.7563),
            visit("Cairns", "Australia", 2, 145.7775, -16.9252),
            visit("Brisbane", "Australia", 2, 153.0251, -27.4698),
            visit("Auckland", "New Zealand", 1, 174.7633, -36.8485),
        ];
        let category = |name: &str, locations: &[&str], color: &str, class_name: &str| {
            PurposeCategory {
                name: name.to_string(),
                locations: locations.iter().map(|s| s.to_string()).collect(),
                color: color.to_string(),
                class_name: class_name.to_string(),
                fallback: false,
            }
        };
        Self {
            visits,
            categories: vec![
                category(
                    "Residence & family",
                    &["Shanghai", "Jiangsu", "Guangzhou", "Hunan"],
                    "#3498db",
                    "d3-map-category-resident",
                ),
                category(
                    "Study",
                    &["Hong Kong", "Minnesota", "New York", "Boston"],
                    "#27ae60",
                    "d3-map-category-academic",
                ),
                PurposeCategory::tourism(),
            ],
        }
    }
}

impl Default for SkillGraph {
    fn default() -> Self {
        let node = |id: &str, label: &str, group: u8, color: &str| GraphNode {
            id: id.to_string(),
            label: label.to_string(),
            group,
            color: color.to_string(),
        };
        let nodes = vec![
            node("Animation", "Animation", 1, "rgb(255, 255, 102)"),
            node("Video editing", "Video editing", 1, "rgba(232, 192, 82, 1)"),
            node("Painting", "Painting", 1, "rgb(247, 163, 92)"),
            node("Visual designing", "Visual designing", 1, "rgb(240, 128, 128)"),
            node("Game developing", "Game developing", 1, "rgb(221, 160, 221)"),
            node("Programming", "Programming", 1, "rgba(240, 120, 158, 1)"),
            node("P5.js", "P5.js", 2, "rgb(255, 255, 224)"),
            node("processing", "processing", 2, "rgba(247, 230, 250, 1)"),
            node("AE", "AE", 2, "rgba(252, 247, 201, 1)"),
            node("PR", "PR", 2, "rgba(255, 250, 224, 1)"),
            node("cap cut", "capcut", 2, "rgba(252, 240, 184, 1)"),
            node("SAI", "SAI", 2, "rgb(255, 218, 185)"),
            node("PS", "PS", 2, "rgba(251, 222, 229, 1)"),
            node("UE5", "UE5", 2, "rgba(249, 222, 220, 1)"),
            node("Python", "Python", 2, "rgba(249, 220, 237, 1)"),
        ];
        let links = [
            ("P5.js", "Animation"),
            ("processing", "Animation"),
            ("processing", "Game developing"),
            ("processing", "Programming"),
            ("AE", "Animation"),
            ("AE", "Video editing"),
            ("PR", "Video editing"),
            ("cap cut", "Video editing"),
            ("Animation", "Video editing"),
            ("Animation", "Painting"),
            ("Animation", "Programming"),
            ("Video editing", "Painting"),
            ("Video editing", "Visual designing"),
            ("Painting", "Visual designing"),
            ("Painting", "SAI"),
            ("Visual designing", "SAI"),
            ("Visual designing", "PS"),
            ("Painting", "PS"),
            ("Game developing", "PS"),
            ("Game developing", "UE5"),
            ("Game developing", "Programming"),
            ("P5.js", "Programming"),
            ("Python", "Programming"),
        ]
        .iter()
        .map(|(s, t)| GraphLink { source: s.to_string(), target: t.to_string() })
        .collect();
        Self { nodes, links }
    }
}

impl Default for CourseMatrix {
    fn default() -> Self {
        let headers: Vec<String> = ["GE2413", "SM2702", "SM2706", "SM2105", "SM3601", "SM3612"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: [[u8; 6]; 6] = [
            [0, 0, 0, 0, 0, 0],
            [1, 0, 1, 1, 0, 0],
            [0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 1],
            [0, 0, 0, 0, 0, 1],
            [0, 0, 0, 0, 0, 0],
        ];
        let rows = headers
            .iter()
            .zip(values.iter())
            .map(|(label, row)| MatrixRow { label: label.clone(), values: row.to_vec() })
            .collect();
        let header_colors = ["#87CEEB", "#4682B4", "#FF8C00", "#FFD700", "#c79eedff", "#32CD32"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self { headers, rows, header_colors }
    }
}

fn default_time_allocation() -> Vec<Slice> {
    [("Painting", 25.0), ("Online Video", 30.0), ("Writing", 25.0), ("Project Planning", 20.0)]
        .iter()
        .map(|(c, v)| Slice { category: c.to_string(), value: *v })
        .collect()
}

fn default_creative_works() -> Vec<CreativeWork> {
    [
        (2021, "paintings", 15),
        (2021, "videos", 5),
        (2021, "games", 1),
        (2022, "paintings", 20),
        (2022, "videos", 8),
        (2023, "videos", 12),
        (2023, "games", 3),
        (2024, "paintings", 10),
        (2024, "games", 5),
    ]
    .iter()
    .map(|(year, kind, count)| CreativeWork { year: *year, kind: kind.to_string(), count: *count })
    .collect()
}

fn default_career() -> Vec<TimelineEntry> {
    vec![
        TimelineEntry {
            year: 2024,
            company_role: "Company: Shanghai Runmi Cultural Media Co.\nPosition: New Media Operations Assistant".to_string(),
            description: "Responsible for content planning, scriptwriting, and video editing for the company's book marketing video channel. Independently managed the entire production process, from material selection to final video output. The average view count of the produced videos ranged from 1k to 3k, and each video contributed to the sale of 5 to 10 copies of the associated books.".to_string(),
            image: "run.jpg".to_string(),
            year_position: Placement::Above,
            description_position: Placement::Below,
            image_position: Placement::Above,
        },
        TimelineEntry {
            year: 2025,
            company_role: "Company: Shanghai Media Group\nPosition: Visual editor".to_string(),
            description: "Assisted in coordinating a cultural tourism campaign in collaboration with the Dunhuang Academy. Mainly responsible for the visual design and procurement negotiation works, contributing creative ideas to facilitate project advancement. This experience provided comprehensive insight into processes and execution patterns of project planning, significantly enhancing my professional expertise and related skills.".to_string(),
            image: "smg.jpg".to_string(),
            year_position: Placement::Above,
            description_position: Placement::Below,
            image_position: Placement::Above,
        },
    ]
}

fn default_skill_tree() -> TreeNode {
    TreeNode::branch(
        "Personal skill",
        vec![
            TreeNode::branch(
                "Painting & designing",
                vec![
                    TreeNode::leaf("Learning from childhood"),
                    TreeNode::leaf("Able to use software such as Photoshop and SAI"),
                    TreeNode::leaf("Once designed the cover for the Korean magazine WEHONG"),
                ],
            ),
            TreeNode::branch(
                "Video editing",
                vec![
                    TreeNode::leaf("Able to use Premiere Rush and After Effect"),
                    TreeNode::leaf("Operating a bilibili account"),
                    TreeNode::leaf("Have internship experience in video account operation"),
                ],
            ),
            TreeNode::branch(
                "Writing",
                vec![
                    TreeNode::leaf("Good at narrative writing"),
                    TreeNode::leaf("Publish fan fiction on the online platform"),
                ],
            ),
            TreeNode::branch(
                "Project planning",
                vec![
                    TreeNode::leaf("Studied relevant knowledge in college"),
                    TreeNode::leaf("Have participated in several planning works"),
                ],
            ),
        ],
    )
}

fn default_gallery() -> Vec<GalleryImage> {
    [
        ("lsm.jpg", Some("LSM Painting")),
        ("yayale.jpg", Some("Yaya Le")),
        ("yabi.jpg", Some("Yabi Lian Lian")),
        ("rukawa.jpg", Some("Rukawa Kaede")),
        ("Autumn.jpg", Some("Boardgame Night")),
        ("mill.jpg", Some("Windmill Scene")),
        ("oikawa.jpg", Some("oigawa")),
        ("mitsui.jpg", None),
    ]
    .iter()
    .map(|(src, alt)| GalleryImage { src: src.to_string(), alt: alt.map(str::to_string) })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let json = r#"{"time_allocation": [{"category": "Reading", "value": 100}]}"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();
        assert_eq!(portfolio.time_allocation.len(), 1);
        assert_eq!(portfolio.skill_graph.nodes.len(), 15);
        assert_eq!(portfolio.creative_works.len(), 9);
    }

    #[test]
    fn travel_section_without_categories_uses_builtin_ones() {
        let portfolio: Portfolio =
            serde_json::from_str(r#"{"travel": {"visits": []}}"#).unwrap();
        assert!(portfolio.travel.visits.is_empty());
        assert_eq!(portfolio.travel.categories.len(), 3);
    }

    #[test]
    fn visits_may_omit_coordinates() {
        let json = r#"{"name": "Atlantis", "country": "Nowhere", "count": 2}"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert!(visit.coords.is_none());
    }

    #[test]
    fn every_default_link_names_known_nodes() {
        let graph = SkillGraph::default();
        for link in &graph.links {
            assert!(graph.nodes.iter().any(|n| n.id == link.source), "{}", link.source);
            assert!(graph.nodes.iter().any(|n| n.id == link.target), "{}", link.target);
        }
    }
}
