use eframe::egui::Color32;

use crate::graph::GroupKind;

pub(in crate::app) const CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const LINK: Color32 = Color32::from_rgb(100, 180, 255);
pub(super) const NODE_OUTLINE: Color32 = Color32::from_rgb(15, 15, 15);
pub(super) const HOVER_RING: Color32 = Color32::from_rgb(255, 255, 255);
pub(super) const SEARCH_RING: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const LABEL: Color32 = Color32::from_gray(238);
pub(super) const LINK_LABEL: Color32 = Color32::from_gray(180);
pub(super) const QUADTREE: Color32 = Color32::from_rgb(106, 198, 255);

pub(in crate::app) fn node_color(kind: GroupKind, label: &str) -> Color32 {
    CATEGORY10[kind.palette_slot(label, CATEGORY10.len())]
}
