use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Au-delà, page*size dépasserait l'OFFSET SQL (i64)
pub const MAX_PAGE: u64 = 1_000_000;

/// Découpe un filtre "A,B,C" en liste (vide = pas de filtre)
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Texte de recherche nettoyé (None si vide)
pub fn clean_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Pagination (page commence à 0)
#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub page: u64,
    pub size: u64,
}

impl Paging {
    pub fn new(page: Option<u64>, size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(0).min(MAX_PAGE),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Numéro de ligne affiché: page*size + index + 1
    pub fn row_number(&self, index: usize) -> u64 {
        self.offset()
            .saturating_add(index as u64)
            .saturating_add(1)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }

    /// Fenêtre d'une pagination faite en mémoire
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items.into_iter().skip(start).take(self.size as usize).collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults_and_clamp() {
        let paging = Paging::new(None, None);
        assert_eq!((paging.page, paging.size), (0, 20));
        assert_eq!(Paging::new(Some(1), Some(0)).size, 1);
        assert_eq!(Paging::new(Some(1), Some(1000)).size, 100);
    }

    #[test]
    fn test_row_number_and_pages() {
        let paging = Paging::new(Some(2), Some(10));
        assert_eq!(paging.row_number(0), 21);
        assert_eq!(paging.total_pages(0), 0);
        assert_eq!(paging.total_pages(21), 3);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let paging = Paging::new(Some(u64::MAX), Some(20));
        assert_eq!(paging.page, MAX_PAGE);
        assert_eq!(paging.row_number(0), MAX_PAGE * 20 + 1);
        assert!(paging.slice(vec![1, 2, 3]).is_empty());

        let raw = Paging { page: u64::MAX, size: MAX_PAGE_SIZE };
        assert_eq!(raw.row_number(5), u64::MAX);
    }

    #[test]
    fn test_slice() {
        let paging = Paging::new(Some(1), Some(2));
        assert_eq!(paging.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert!(Paging::new(Some(5), Some(2)).slice(vec![1, 2]).is_empty());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("NEW, INPROGRESS,,")), vec!["NEW", "INPROGRESS"]);
        assert!(split_list(None).is_empty());
        assert_eq!(clean_search(Some("  java ")), Some("java".to_string()));
        assert_eq!(clean_search(Some("  ")), None);
    }
}
