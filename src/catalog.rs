// src/catalog.rs
//! Bulletin publications and their download URLs.
//!
//! Publication home:
//! http://www.gks.ru/wps/wcm/connect/rosstat_main/rosstat/ru/statistics/publications/catalog/doc_1140086922125

use chrono::{Datelike, Months, NaiveDate};
use std::{fmt, str::FromStr};

use crate::error::Error;

/// One bulletin file: short target name, file stem on the site, title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub target: &'static str,
    pub file: &'static str,
    pub title: &'static str,
}

const fn publication(target: &'static str, file: &'static str, title: &'static str) -> Publication {
    Publication {
        target,
        file,
        title,
    }
}

/// Files whose numbering never changes.
static STABLE: &[Publication] = &[
    publication("main", "1-0", "Основные экономические и социальные показатели"),
    publication("retail", "3-1", "Розничная торговля"),
    publication("bop", "3-2", "Внешняя торговля"),
    publication("pri", "4-0", "Индекс цен и тарифов"),
    publication("cpi", "4-1", "Потребительские цены"),
    publication("ppi", "4-2", "Цены производителей"),
    publication("odue", "5-0", "Просроченная кредиторская задолженность организаций"),
    publication("soc", "6-0", "Уровень жизни населения"),
    publication("lab", "7-0", "Занятость и безработица"),
    publication("dem", "8-0", "Демография"),
];

const PWR_TITLE: &str =
    "Обеспечение электрической энергией, газом и паром;кондиционирование воздуха";
const WAT_TITLE: &str = "Водоснабжение; водоотведение, организация сбора и утилизации отходов, деятельность по ликвидации загрязнений";

/// Section 2 numbering in most months.
static SECTION2_A: &[Publication] = &[
    publication("ip", "2-1-0", "Индекс промышленного производства"),
    publication("mng", "2-1-1", "Добыча полезных ископаемых"),
    publication("mnf", "2-1-2", "Обрабатывающие производства"),
    publication("pwr", "2-1-3", PWR_TITLE),
    publication("wat", "2-1-4", WAT_TITLE),
    publication("agro", "2-2-1", "Сельское хозяйство"),
    publication("wood", "2-2-2", "Лесозаготовки"),
    publication("constr", "2-3", "Строительство"),
    publication("trans", "2-4", "Транспорт"),
];

/// Section 2 numbering in months that carry a GDP release.
static SECTION2_B: &[Publication] = &[
    publication("gdp", "2-1", "Валовой внутренний продукт"),
    publication("ip", "2-2-0", "Индекс промышленного производства"),
    publication("mng", "2-2-1", "Добыча полезных ископаемых"),
    publication("mnf", "2-2-2", "Обрабатывающие производства"),
    publication("pwr", "2-2-3", PWR_TITLE),
    publication("wat", "2-2-4", WAT_TITLE),
    publication("agro", "2-3-1", "Сельское хозяйство"),
    publication("wood", "2-3-2", "Лесозаготовки"),
    publication("constr", "2-4", "Строительство"),
    publication("trans", "2-5", "Транспорт"),
];

const SECTION2_B_MONTHS: [u32; 4] = [5, 6, 8, 9];

/// Find the publication for `target` as numbered in `month`.
pub fn resolve(target: &str, month: u32) -> Option<&'static Publication> {
    let section2 = if SECTION2_B_MONTHS.contains(&month) {
        SECTION2_B
    } else {
        SECTION2_A
    };
    STABLE
        .iter()
        .chain(section2.iter())
        .find(|p| p.target == target)
}

/// Download URL of a bulletin file, e.g.
/// `http://www.gks.ru/bgd/regl/b17_01/IssWWW.exe/Stg/d10/1-0.doc`.
pub fn bulletin_url(period: Period, file: &str) -> String {
    format!(
        "http://www.gks.ru/bgd/regl/b{}_01/IssWWW.exe/Stg/d{:02}/{}.doc",
        period.year - 2000,
        period.month,
        file
    )
}

/// A bulletin month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, Error> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::from)
            .ok_or_else(|| Error::InvalidDate(format!("{year:04}-{month:02}")))
    }

    fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl From<NaiveDate> for Period {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::InvalidDate(s.to_string());
        if s.len() != 7 || s.as_bytes()[4] != b'-' {
            return Err(bad());
        }
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(Self::from)
            .map_err(|_| bad())
    }
}

/// First month with bulletins in the current format.
pub const FIRST_PERIOD: Period = Period {
    year: 2016,
    month: 1,
};

/// Every month from `start` through `end`, inclusive.
pub fn official_dates(start: Period, end: Period) -> Vec<Period> {
    let mut out = Vec::new();
    let mut day = start.first_day();
    let last = end.first_day();
    while day <= last {
        out.push(Period::from(day));
        match day.checked_add_months(Months::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_matches_site_layout() {
        let p = Period::new(2017, 10).unwrap();
        assert_eq!(
            bulletin_url(p, "1-0"),
            "http://www.gks.ru/bgd/regl/b17_01/IssWWW.exe/Stg/d10/1-0.doc"
        );
        assert_eq!(
            bulletin_url(Period::new(2016, 3).unwrap(), "2-1-0"),
            "http://www.gks.ru/bgd/regl/b16_01/IssWWW.exe/Stg/d03/2-1-0.doc"
        );
    }

    #[test]
    fn section_two_numbering_depends_on_month() {
        assert_eq!(resolve("main", 5).unwrap().file, "1-0");
        assert_eq!(resolve("ip", 10).unwrap().file, "2-1-0");
        assert_eq!(resolve("ip", 9).unwrap().file, "2-2-0");
        assert_eq!(resolve("trans", 6).unwrap().file, "2-5");
        assert!(resolve("gdp", 10).is_none());
        assert_eq!(resolve("gdp", 8).unwrap().title, "Валовой внутренний продукт");
        assert!(resolve("nope", 1).is_none());
    }

    #[test]
    fn period_parsing() {
        let p: Period = "2017-10".parse().unwrap();
        assert_eq!(p, Period { year: 2017, month: 10 });
        assert_eq!(p.to_string(), "2017-10");
        for bad in ["2017-13", "2017-1", "201710", "2017/10"] {
            assert!(bad.parse::<Period>().is_err(), "{bad}");
        }
        assert!(Period::new(2017, 0).is_err());
    }

    #[test]
    fn monthly_range_is_inclusive() {
        let dates = official_dates(FIRST_PERIOD, Period::new(2017, 10).unwrap());
        assert_eq!(dates.len(), 22);
        assert_eq!(dates.first().unwrap().to_string(), "2016-01");
        assert_eq!(dates[12].to_string(), "2017-01");
        assert_eq!(dates.last().unwrap().to_string(), "2017-10");
        assert!(official_dates(Period::new(2017, 2).unwrap(), FIRST_PERIOD).is_empty());
    }
}
