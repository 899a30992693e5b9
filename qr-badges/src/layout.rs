//! Badge layout: records become fixed-size grid pages matching the label
//! sheet.
//!
//! Cells fill row-major (left to right, then top to bottom), one page per
//! `columns_per_page * rows_per_page` records. The final page is padded
//! with blank cells so printed badges stay on their pre-cut positions.

use crate::assets::{Assets, Logo, LogoKind};
use crate::config::LayoutConfig;
use crate::qr::QrBitmap;
use crate::roster::BadgeRecord;

/// A record with its QR bitmap, before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBadge {
    pub record: BadgeRecord,
    pub qr: QrBitmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedLogo<'a> {
    pub kind: LogoKind,
    pub image: &'a Logo,
}

/// A badge with every image it will show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBadge<'a> {
    pub record: BadgeRecord,
    pub qr: QrBitmap,
    /// Top-left mark: the small logo, or the full logo on the designated page
    pub logo: Option<PlacedLogo<'a>>,
    /// Decorative background strip
    pub ribbon: Option<PlacedLogo<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell<'a> {
    Badge(Box<RenderedBadge<'a>>),
    Blank,
}

impl<'a> Cell<'a> {
    pub fn badge(&self) -> Option<&RenderedBadge<'a>> {
        match self {
            Cell::Badge(badge) => Some(badge),
            Cell::Blank => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }
}

/// One printed sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    /// 1-based
    pub number: usize,
    /// Exactly `columns_per_page * rows_per_page` cells, row-major
    pub cells: Vec<Cell<'a>>,
    pub columns: usize,
}

impl<'a> Page<'a> {
    /// Cells grouped into grid rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell<'a>]> {
        self.cells.chunks(self.columns)
    }

    pub fn badge_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blank()).count()
    }

    /// Cell at grid position (`row`, `column`), both 0-based.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell<'a>> {
        if column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }
}

/// Place `badges` onto pages in input order.
pub fn lay_out<'a>(
    badges: Vec<EncodedBadge>,
    config: &LayoutConfig,
    assets: &'a Assets,
) -> Vec<Page<'a>> {
    let per_page = config.cells_per_page();
    let mut pages: Vec<Page<'a>> = Vec::with_capacity(badges.len().div_ceil(per_page));
    let mut badges = badges.into_iter().peekable();

    while badges.peek().is_some() {
        let number = pages.len() + 1;
        let logo = badge_logo(number, config, assets);
        let ribbon = assets.ribbon.as_ref().map(|image| PlacedLogo {
            kind: LogoKind::Ribbon,
            image,
        });

        let mut cells: Vec<Cell<'a>> = badges
            .by_ref()
            .take(per_page)
            .map(|badge| {
                Cell::Badge(Box::new(RenderedBadge {
                    record: badge.record,
                    qr: badge.qr,
                    logo,
                    ribbon,
                }))
            })
            .collect();

        let blanks = per_page - cells.len();
        if blanks > 0 {
            log::debug!("Page {} padded with {} blank cells", number, blanks);
            cells.extend(std::iter::repeat_with(|| Cell::Blank).take(blanks));
        }

        pages.push(Page {
            number,
            cells,
            columns: config.columns_per_page,
        });
    }

    log::info!("Laid out {} pages of {} cells", pages.len(), per_page);
    pages
}

fn badge_logo<'a>(page: usize, config: &LayoutConfig, assets: &'a Assets) -> Option<PlacedLogo<'a>> {
    let kind = if config.full_logo_page == Some(page) && assets.full.is_some() {
        LogoKind::Full
    } else {
        LogoKind::Small
    };
    assets.get(kind).map(|image| PlacedLogo { kind, image })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badges(n: usize) -> Vec<EncodedBadge> {
        (0..n)
            .map(|i| EncodedBadge {
                record: BadgeRecord {
                    row: i + 1,
                    preferred_name: format!("P{}", i),
                    last_name: format!("L{}", i),
                    code: format!("https://x.test/{}", i),
                },
                qr: QrBitmap {
                    png: vec![i as u8],
                    pixels: 64,
                    modules: 21,
                },
            })
            .collect()
    }

    fn logo(width: u32) -> Logo {
        Logo {
            png: vec![0; 4],
            width_px: width,
            height_px: 10,
        }
    }

    #[test]
    fn ten_records_make_two_pages() {
        let config = LayoutConfig::default();
        let assets = Assets::none();
        let pages = lay_out(badges(10), &config, &assets);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].cells.len(), 8);
        assert_eq!(pages[0].badge_count(), 8);
        assert_eq!(pages[1].cells.len(), 8);
        assert_eq!(pages[1].badge_count(), 2);
        assert!(pages[1].cells[2..].iter().all(Cell::is_blank));
        assert_eq!(pages[1].number, 2);
    }

    #[test]
    fn page_count_is_ceiling_of_records_over_cells() {
        let config = LayoutConfig::default();
        let assets = Assets::none();
        for n in [1, 7, 8, 9, 16, 17, 33] {
            let pages = lay_out(badges(n), &config, &assets);
            assert_eq!(pages.len(), n.div_ceil(8), "n = {}", n);
            assert!(pages.iter().all(|p| p.cells.len() == 8));
        }
    }

    #[test]
    fn no_records_no_pages() {
        let assets = Assets::none();
        let pages = lay_out(Vec::new(), &LayoutConfig::default(), &assets);
        assert!(pages.is_empty());
    }

    #[test]
    fn records_fill_row_major() {
        let config = LayoutConfig::default();
        let assets = Assets::none();
        let pages = lay_out(badges(19), &config, &assets);

        for k in 0..19 {
            let page = &pages[k / 8];
            let slot = k % 8;
            let cell = page.cell(slot / 2, slot % 2).unwrap();
            assert_eq!(cell.badge().unwrap().record.row, k + 1, "record {}", k);
        }

        let second_row: Vec<_> = pages[0]
            .rows()
            .nth(1)
            .unwrap()
            .iter()
            .map(|c| c.badge().unwrap().record.preferred_name.clone())
            .collect();
        assert_eq!(second_row, ["P2", "P3"]);
    }

    #[test]
    fn grid_follows_config() {
        let config = LayoutConfig {
            columns_per_page: 3,
            rows_per_page: 2,
            ..LayoutConfig::default()
        };
        let assets = Assets::none();
        let pages = lay_out(badges(7), &config, &assets);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].rows().count(), 2);
        assert_eq!(pages[0].rows().next().unwrap().len(), 3);
        assert_eq!(pages[1].badge_count(), 1);
    }

    #[test]
    fn small_logo_and_ribbon_on_every_badge() {
        let assets = Assets {
            full: Some(logo(100)),
            small: Some(logo(20)),
            ribbon: Some(logo(300)),
        };
        let pages = lay_out(badges(3), &LayoutConfig::default(), &assets);
        for cell in pages[0].cells.iter().filter_map(Cell::badge) {
            assert_eq!(cell.logo.unwrap().kind, LogoKind::Small);
            assert_eq!(cell.ribbon.unwrap().kind, LogoKind::Ribbon);
        }
    }

    #[test]
    fn full_logo_on_designated_page() {
        let assets = Assets {
            full: Some(logo(100)),
            small: Some(logo(20)),
            ribbon: None,
        };
        let config = LayoutConfig {
            full_logo_page: Some(2),
            ..LayoutConfig::default()
        };
        let pages = lay_out(badges(12), &config, &assets);

        let kinds = |page: &Page| -> Vec<LogoKind> {
            page.cells
                .iter()
                .filter_map(Cell::badge)
                .map(|b| b.logo.unwrap().kind)
                .collect()
        };
        assert!(kinds(&pages[0]).iter().all(|k| *k == LogoKind::Small));
        assert!(kinds(&pages[1]).iter().all(|k| *k == LogoKind::Full));
        assert!(pages[1].cells.iter().filter_map(Cell::badge).all(|b| b.ribbon.is_none()));
    }

    #[test]
    fn missing_logos_leave_badges_bare() {
        let assets = Assets::none();
        let pages = lay_out(badges(1), &LayoutConfig::default(), &assets);
        let badge = pages[0].cells[0].badge().unwrap();
        assert!(badge.logo.is_none());
        assert!(badge.ribbon.is_none());
    }
}
