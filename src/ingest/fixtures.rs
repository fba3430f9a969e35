/// Test fixtures: representative temperature exports.
///
/// The station export uses Korean headers (the defaults in
/// `config::ColumnConfig`):
///
///   날짜      — reading date (date-only in most exports)
///   통합국명  — site name
///   모듈번호  — module number
///   hh        — hour of day, 0–23
///   온도      — temperature, °C
///
/// `fixture_plant_datetime_csv` uses English headers and full timestamps
/// with no hour column, exercising the derived-hour path.

/// Three rows, one site, two days. Daily means 21.0 / 30.0, overall 24.0,
/// mean of module means 23.5.
#[cfg(test)]
pub(crate) fn fixture_spec_example_csv() -> &'static str {
    "날짜,통합국명,모듈번호,hh,온도\n\
     2024-01-01,SiteA,M1,10,20.0\n\
     2024-01-01,SiteA,M2,10,22.0\n\
     2024-01-02,SiteA,M1,11,30.0\n"
}

/// Two sites with different latest dates.
///
/// SiteA (latest 2024-01-09):
/// - 2024-01-09 has modules 10, 2 (twice at hour 9, a duplicate ingest), 2
///   at hour 13 and 1 at hour 13. Snapshot cells: 1/13 = 27.5,
///   2/9 = 22.5, 2/13 = 26.0, 10/9 = 21.0.
/// - The 7-day window [01-02, 01-09] excludes the 01-01 row.
///   Window rows: 19.0, 25.5, 24.0, 21.0, 22.0, 23.0, 26.0, 27.5.
///
/// SiteB (latest 2024-01-02) has two rows.
#[cfg(test)]
pub(crate) fn fixture_two_sites_csv() -> &'static str {
    "날짜,통합국명,모듈번호,hh,온도\n\
     2024-01-01,SiteA,1,9,18.0\n\
     2024-01-01,SiteB,1,9,10.0\n\
     2024-01-02,SiteA,2,9,19.0\n\
     2024-01-02,SiteB,2,10,12.0\n\
     2024-01-05,SiteA,1,14,25.5\n\
     2024-01-08,SiteA,2,14,24.0\n\
     2024-01-09,SiteA,10,9,21.0\n\
     2024-01-09,SiteA,2,9,22.0\n\
     2024-01-09,SiteA,2,9,23.0\n\
     2024-01-09,SiteA,2,13,26.0\n\
     2024-01-09,SiteA,1,13,27.5\n"
}

/// Full timestamps, no hour column, one site. Latest is 2024-03-15 12:00.
/// Gaps between 03-01, 03-10, 03-14 and 03-15 are intentional.
#[cfg(test)]
pub(crate) fn fixture_plant_datetime_csv() -> &'static str {
    "timestamp,site,module,temp\n\
     2024-03-01 00:00:00,Plant,A,5.0\n\
     2024-03-01 12:00:00,Plant,A,7.0\n\
     2024-03-10 08:00:00,Plant,A,9.0\n\
     2024-03-14 23:00:00,Plant,B,11.0\n\
     2024-03-15 06:00:00,Plant,A,8.0\n\
     2024-03-15 06:00:00,Plant,B,6.0\n\
     2024-03-15 12:00:00,Plant,A,12.0\n"
}

/// UTF-8 BOM, CRLF line endings, a quoted site name containing the
/// delimiter, and no terminator after the last record.
#[cfg(test)]
pub(crate) fn fixture_bom_quoted_crlf_csv() -> &'static str {
    "\u{feff}날짜,통합국명,모듈번호,hh,온도\r\n\
     2024-02-01,\"Seoul, Gangnam\",1,0,3.5\r\n\
     2024-02-01,Busan,1,0,8.0\r\n\
     2024-02-02,\"Seoul, Gangnam\",2,1,4.5"
}

/// Temperature column renamed: the loader must report it missing.
#[cfg(test)]
pub(crate) fn fixture_missing_temperature_csv() -> &'static str {
    "날짜,통합국명,모듈번호,hh,temp\n\
     2024-01-01,SiteA,1,0,1.0\n"
}

/// Second data row carries an unparseable date.
#[cfg(test)]
pub(crate) fn fixture_bad_timestamp_csv() -> &'static str {
    "날짜,통합국명,모듈번호,hh,온도\n\
     2024-01-01,SiteA,1,0,1.0\n\
     not-a-date,SiteA,1,1,2.0\n"
}
