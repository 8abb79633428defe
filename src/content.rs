//! Copy shown in the overlay panels and the marker labels.

use bevy::prelude::*;

use crate::zones::ZoneId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAnchor {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub enum Block {
    Paragraph(&'static str),
    Heading(&'static str),
    Bullets(&'static [&'static str]),
    /// Title, one-line summary, tags.
    Project(&'static str, &'static str, &'static [&'static str]),
    /// Label, value.
    Link(&'static str, &'static str),
    Separator,
}

#[derive(Debug)]
pub struct PanelContent {
    pub title: &'static str,
    pub anchor: PanelAnchor,
    pub blocks: &'static [Block],
}

/// What the glowing marker of a zone looks like.
#[derive(Debug)]
pub struct MarkerStyle {
    pub label: &'static str,
    pub color: Color,
}

const ABOUT: PanelContent = PanelContent {
    title: "About Me",
    anchor: PanelAnchor::Left,
    blocks: &[
        Block::Paragraph(
            "Developer working across the web, real-time graphics and \
             interactive tools, usually somewhere between the renderer and the UI.",
        ),
        Block::Paragraph(
            "Away from the keyboard: long walks, small games, and taking apart \
             whatever new technology showed up this week.",
        ),
        Block::Heading("Skills"),
        Block::Bullets(&[
            "Rust, TypeScript",
            "Real-time 3D and shaders",
            "Game and tool UI",
            "Interaction design",
        ]),
    ],
};

const PROJECTS: PanelContent = PanelContent {
    title: "Projects",
    anchor: PanelAnchor::Center,
    blocks: &[
        Block::Project(
            "Walkable Portfolio",
            "This page: a tiny 3D world you walk through to read about me.",
            &["Bevy", "egui"],
        ),
        Block::Separator,
        Block::Project(
            "Metrics Dashboard",
            "Interactive charts for digging through large time series.",
            &["WebGL", "SVG"],
        ),
        Block::Separator,
        Block::Project(
            "Product Viewer",
            "Spin, zoom and annotate 3D models in the browser.",
            &["WebXR", "glTF"],
        ),
    ],
};

const CONTACT: PanelContent = PanelContent {
    title: "Contact",
    anchor: PanelAnchor::Right,
    blocks: &[
        Block::Paragraph("Always happy to hear about new projects and collaborations."),
        Block::Link("Email", "hello@example.com"),
        Block::Link("GitHub", "github.com/example"),
        Block::Link("LinkedIn", "linkedin.com/in/example"),
        Block::Separator,
        Block::Paragraph("Open to freelance work and full-time positions."),
    ],
};

pub fn panel_for(id: ZoneId) -> Option<&'static PanelContent> {
    match id {
        ZoneId::ABOUT => Some(&ABOUT),
        ZoneId::PROJECTS => Some(&PROJECTS),
        ZoneId::CONTACT => Some(&CONTACT),
        _ => None,
    }
}

pub fn marker_for(id: ZoneId) -> MarkerStyle {
    match id {
        ZoneId::ABOUT => MarkerStyle {
            label: "About Me",
            color: Color::srgb_u8(0x8b, 0x5c, 0xf6),
        },
        ZoneId::PROJECTS => MarkerStyle {
            label: "Projects",
            color: Color::srgb_u8(0x63, 0x66, 0xf1),
        },
        ZoneId::CONTACT => MarkerStyle {
            label: "Contact",
            color: Color::srgb_u8(0xec, 0x48, 0x99),
        },
        other => MarkerStyle {
            label: other.as_str(),
            color: Color::WHITE,
        },
    }
}
