//! The report session: one connection, one chart sink, the report operations.
//!
//! Each operation builds its queries, runs them sequentially, reshapes the
//! rows and hands the resulting charts to the sink before returning.

use olympics_core::AthleteFilter;
use olympics_graph::queries::{build, BuiltQuery};
use olympics_graph::{QueryExecutor, QueryShape};

use crate::chart::{bar_chart, line_chart, pie_chart, ChartSpec, PieChart};
use crate::error::Result;
use crate::merge::{coerce, contribution_percent, outer_join};
use crate::projector::{project, ColumnSet};
use crate::sink::ChartSink;
use crate::types::{
    DisciplineReport, HomonymCandidate, MedalCharts, MedalReport, MedalRow, PostCountReport,
    RunSummary, SexCompositionReport, SexCompositionRow,
};

/// Owns the connection handle and the chart sink for a report run.
///
/// Dropped by [`ReportSession::close`], which consumes the session so the
/// connection is released exactly once.
pub struct ReportSession<E, S> {
    executor: E,
    sink: S,
    charts_emitted: usize,
}

impl<E: QueryExecutor, S: ChartSink> ReportSession<E, S> {
    pub fn new(executor: E, sink: S) -> Self {
        Self {
            executor,
            sink,
            charts_emitted: 0,
        }
    }

    pub fn charts_emitted(&self) -> usize {
        self.charts_emitted
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Reports ──────────────────────────────────────────────────

    /// Line chart of tweets mentioning the athlete, per year.
    pub async fn post_counts(&mut self, filter: &AthleteFilter) -> Result<PostCountReport> {
        let posts_query = build(QueryShape::PostMentionsByYear, filter);
        log_warnings(&[&posts_query]);
        let set = self.run_query(posts_query).await?;

        let years = set.labels("annee")?;
        let posts = coerce("tweet_count", set.column("tweet_count")?)?;

        self.emit(line_chart(
            format!("Posts per year mentioning {}", filter.name),
            "Year",
            "Posts",
            years.clone(),
            posts.clone(),
        ))?;

        Ok(PostCountReport { years, posts })
    }

    /// Medals won per games year, joined with the country's medal total.
    ///
    /// `charts.count` renders one bar chart; `charts.percent` renders one pie
    /// per year showing the athlete's share of the country total.
    pub async fn medal_report(
        &mut self,
        filter: &AthleteFilter,
        charts: MedalCharts,
    ) -> Result<MedalReport> {
        let medals_query = build(QueryShape::MedalCountByYear, filter);
        let totals_query = build(QueryShape::TotalContributionByYear, filter);
        log_warnings(&[&medals_query, &totals_query]);

        let medals = self
            .run_query(medals_query)
            .await?
            .keyed("annee", "nombre_de_medailles_athlete")?;
        let totals = self
            .run_query(totals_query)
            .await?
            .keyed("annee", "total_medailles_pays")?;

        let rows: Vec<MedalRow> = outer_join(&medals, &totals)?
            .into_iter()
            .map(|r| MedalRow {
                year: r.year,
                medals: r.left,
                country_total: r.right,
                percent: contribution_percent(r.left, r.right),
            })
            .collect();

        if charts.count {
            self.emit(bar_chart(
                format!("Medals won per year by {}", filter.name),
                "Games year",
                "Medals won",
                rows.iter().map(|r| r.year.to_string()).collect(),
                rows.iter().map(|r| r.medals).collect(),
            ))?;
        }

        if charts.percent {
            for row in &rows {
                let pie = pie_chart(
                    format!(
                        "Share of the country's medals contributed by {} in {}",
                        filter.name, row.year
                    ),
                    filter.name.clone(),
                    "Other contributions",
                    row.medals,
                    row.country_total,
                );
                self.emit_pie(pie, row.year)?;
            }
        }

        Ok(MedalReport { rows })
    }

    /// Bar chart of medals per year only.
    pub async fn medal_counts(&mut self, filter: &AthleteFilter) -> Result<MedalReport> {
        let charts = MedalCharts {
            count: true,
            percent: false,
        };
        self.medal_report(filter, charts).await
    }

    /// Per-year contribution pies only.
    pub async fn medal_percentages(&mut self, filter: &AthleteFilter) -> Result<MedalReport> {
        let charts = MedalCharts {
            count: false,
            percent: true,
        };
        self.medal_report(filter, charts).await
    }

    /// Bar chart of editions per discipline.
    pub async fn discipline_histogram(&mut self, filter: &AthleteFilter) -> Result<DisciplineReport> {
        let disciplines_query = build(QueryShape::DisciplineParticipation, filter);
        log_warnings(&[&disciplines_query]);
        let set = self.run_query(disciplines_query).await?;

        let disciplines = set.labels("discipline")?;
        let participations = coerce("nb_participations", set.column("nb_participations")?)?;

        self.emit(bar_chart(
            format!("Participations per discipline for {}", filter.name),
            "Discipline",
            "Participations",
            disciplines.clone(),
            participations.clone(),
        ))?;

        Ok(DisciplineReport {
            disciplines,
            participations,
        })
    }

    /// One pie per edition: athletes of the same sex vs. the others.
    pub async fn sex_composition(&mut self, filter: &AthleteFilter) -> Result<SexCompositionReport> {
        let sex_query = build(QueryShape::AthleteSex, filter);
        let same_query = build(QueryShape::SexCompositionByYear, filter);
        let all_query = build(QueryShape::ParticipantsByYear, filter);
        log_warnings(&[&sex_query, &same_query, &all_query]);

        let sexes: Vec<String> = self
            .run_query(sex_query)
            .await?
            .column("sexe")?
            .iter()
            .filter(|cell| !cell.is_null())
            .map(|cell| cell.label())
            .collect();

        let Some(sex) = sexes.first().cloned() else {
            tracing::info!(athlete = %filter.name, "No recorded sex, skipping sex composition");
            return Ok(SexCompositionReport::default());
        };
        if sexes.len() > 1 {
            tracing::warn!(
                athlete = %filter.name,
                sexes = ?sexes,
                using = %sex,
                "Several athletes match with different sexes"
            );
        }

        let same = self
            .run_query(same_query.bind("sex", sex.clone()))
            .await?
            .keyed("annee", "nb_same_sex")?;
        let all = self
            .run_query(all_query)
            .await?
            .keyed("annee", "total")?;

        let mut rows = Vec::new();
        for merged in outer_join(&same, &all)? {
            let pie = pie_chart(
                format!("Sex distribution in {}", merged.year),
                format!("Same sex as {}", filter.name),
                "Other sex",
                merged.left,
                merged.right,
            );
            rows.push(SexCompositionRow {
                year: merged.year,
                same_sex: merged.left,
                total: merged.right,
                other_sex: pie.chart.values[1],
            });
            self.emit_pie(pie, merged.year)?;
        }

        Ok(SexCompositionReport {
            sex: Some(sex),
            rows,
        })
    }

    /// Every (birth date, country) recorded under the filter's name.
    pub async fn homonym_candidates(&self, filter: &AthleteFilter) -> Result<Vec<HomonymCandidate>> {
        let candidates_query = build(QueryShape::HomonymCandidates, filter);
        log_warnings(&[&candidates_query]);
        let set = self.run_query(candidates_query).await?;

        let non_null = |cell: &olympics_core::CellValue| (!cell.is_null()).then(|| cell.label());
        Ok(set
            .column("born")?
            .iter()
            .zip(set.column("country")?)
            .map(|(born, country)| HomonymCandidate {
                born: non_null(born),
                country: non_null(country),
            })
            .collect())
    }

    /// Run the four reports in their fixed order.
    pub async fn run_all(&mut self, filter: &AthleteFilter, charts: MedalCharts) -> Result<RunSummary> {
        let posts = self.post_counts(filter).await?;
        let medals = self.medal_report(filter, charts).await?;
        let disciplines = self.discipline_histogram(filter).await?;
        let sex_composition = self.sex_composition(filter).await?;

        Ok(RunSummary {
            posts,
            medals,
            disciplines,
            sex_composition,
        })
    }

    /// Finish the sink and release the connection.
    pub fn close(mut self) -> Result<()> {
        let finished = self.sink.finish();
        let charts = self.charts_emitted;
        drop(self.executor);
        tracing::info!(charts, "Report session closed, connection released");
        finished
    }

    // ── Internals ────────────────────────────────────────────────

    async fn run_query(&self, built: BuiltQuery) -> Result<ColumnSet> {
        tracing::debug!(shape = ?built.shape, variant = %built.variant, "Running query");

        let outcome = self.executor.execute(&built.query).await?;
        Ok(project(&outcome.rows, built.query.columns))
    }

    fn emit(&mut self, chart: ChartSpec) -> Result<()> {
        self.sink.emit(&chart)?;
        self.charts_emitted += 1;
        Ok(())
    }

    fn emit_pie(&mut self, pie: PieChart, year: i64) -> Result<()> {
        if let Some(warning) = &pie.warning {
            tracing::warn!(year, title = %pie.chart.title, "{warning}");
        }
        self.emit(pie.chart)
    }
}

/// Distinct warnings attached to the queries of one report operation.
fn distinct_warnings<'a>(queries: &[&'a BuiltQuery]) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for warning in queries.iter().flat_map(|q| &q.warnings) {
        if !seen.contains(&warning.as_str()) {
            seen.push(warning.as_str());
        }
    }
    seen
}

fn log_warnings(queries: &[&BuiltQuery]) {
    for warning in distinct_warnings(queries) {
        tracing::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use olympics_core::{CellValue, ResultRow};
    use olympics_graph::{CypherQuery, GraphError, QueryOutcome};

    use super::*;
    use crate::chart::ChartKind;

    /// Serves canned rows per query shape, recognised by their columns.
    #[derive(Default)]
    struct FakeExecutor {
        rows: HashMap<&'static [&'static str], Vec<ResultRow>>,
        executed: Mutex<Vec<CypherQuery>>,
    }

    impl FakeExecutor {
        fn with(mut self, shape: QueryShape, rows: Vec<ResultRow>) -> Self {
            self.rows.insert(shape.columns(), rows);
            self
        }
    }

    impl QueryExecutor for FakeExecutor {
        async fn execute(&self, query: &CypherQuery) -> std::result::Result<QueryOutcome, GraphError> {
            self.executed.lock().unwrap().push(query.clone());
            let rows = self.rows.get(query.columns).cloned().unwrap_or_default();
            Ok(QueryOutcome::new(rows, 1))
        }
    }

    struct FailingExecutor;

    impl QueryExecutor for FailingExecutor {
        async fn execute(&self, _query: &CypherQuery) -> std::result::Result<QueryOutcome, GraphError> {
            Err(GraphError::Connection("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        charts: Vec<ChartSpec>,
        finished: usize,
    }

    impl ChartSink for RecordingSink {
        fn emit(&mut self, chart: &ChartSpec) -> Result<()> {
            self.charts.push(chart.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished += 1;
            Ok(())
        }
    }

    fn row(pairs: &[(&str, CellValue)]) -> ResultRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn jane_born() -> AthleteFilter {
        AthleteFilter::new("Jane Doe")
            .unwrap()
            .with_born(Some("1990-05-01"))
    }

    fn medal_executor() -> FakeExecutor {
        FakeExecutor::default()
            .with(
                QueryShape::MedalCountByYear,
                vec![
                    row(&[
                        ("annee", CellValue::Int(2004)),
                        ("nombre_de_medailles_athlete", CellValue::Int(2)),
                        ("total_medailles_pays", CellValue::Int(30)),
                    ]),
                    row(&[
                        ("annee", CellValue::Int(2008)),
                        ("nombre_de_medailles_athlete", CellValue::Int(1)),
                        ("total_medailles_pays", CellValue::Int(25)),
                    ]),
                ],
            )
            .with(
                QueryShape::TotalContributionByYear,
                vec![
                    row(&[
                        ("annee", CellValue::Int(2004)),
                        ("total_medailles_pays", CellValue::Float(30.0)),
                    ]),
                    row(&[
                        ("annee", CellValue::Int(2008)),
                        ("total_medailles_pays", CellValue::from("25")),
                    ]),
                ],
            )
    }

    #[tokio::test]
    async fn test_medal_report_percentages() {
        let mut session = ReportSession::new(medal_executor(), RecordingSink::default());
        let report = session
            .medal_report(&jane_born(), MedalCharts::default())
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].year, 2004);
        assert_eq!(report.rows[0].medals, 2);
        assert_eq!(report.rows[0].country_total, 30);
        assert!((report.rows[0].percent - 6.7).abs() < 0.05);
        assert_eq!(report.rows[1].year, 2008);
        assert_eq!(report.rows[1].percent, 4.0);

        // One bar chart, then one pie per year.
        let kinds: Vec<ChartKind> = session.sink().charts.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChartKind::Bar, ChartKind::Pie, ChartKind::Pie]);
        assert_eq!(session.sink().charts[0].values, vec![2, 1]);
        assert_eq!(session.sink().charts[0].categories, vec!["2004", "2008"]);
        assert_eq!(session.sink().charts[1].values, vec![2, 28]);
        assert_eq!(session.sink().charts[2].values, vec![1, 24]);
    }

    #[tokio::test]
    async fn test_medal_report_uses_birth_date_parameters() {
        let mut session = ReportSession::new(medal_executor(), RecordingSink::default());
        session.medal_counts(&jane_born()).await.unwrap();

        let executed = session.executor.executed.lock().unwrap();
        assert_eq!(executed.len(), 2);
        for query in executed.iter() {
            assert_eq!(query.params["name"], "Jane Doe");
            assert_eq!(query.params["born"], "1990-05-01");
            assert!(!query.text.contains("Jane Doe"));
        }
    }

    #[tokio::test]
    async fn test_medal_toggles() {
        let mut session = ReportSession::new(medal_executor(), RecordingSink::default());
        session.medal_counts(&jane_born()).await.unwrap();
        assert_eq!(session.charts_emitted(), 1);

        let mut session = ReportSession::new(medal_executor(), RecordingSink::default());
        session.medal_percentages(&jane_born()).await.unwrap();
        assert!(session
            .sink()
            .charts
            .iter()
            .all(|c| c.kind == ChartKind::Pie));
        assert_eq!(session.charts_emitted(), 2);
    }

    #[tokio::test]
    async fn test_medal_years_without_medals_are_kept() {
        let executor = FakeExecutor::default().with(
            QueryShape::TotalContributionByYear,
            vec![row(&[
                ("annee", CellValue::Int(2012)),
                ("total_medailles_pays", CellValue::Int(0)),
            ])],
        );
        let mut session = ReportSession::new(executor, RecordingSink::default());
        let report = session.medal_percentages(&jane_born()).await.unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].medals, 0);
        assert_eq!(report.rows[0].percent, 0.0);
        // Zero total: the whole becomes 1.
        assert_eq!(session.sink().charts[0].values, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_sex_composition_full_subject() {
        let executor = FakeExecutor::default()
            .with(
                QueryShape::AthleteSex,
                vec![row(&[("sexe", CellValue::from("F"))])],
            )
            .with(
                QueryShape::SexCompositionByYear,
                vec![row(&[
                    ("annee", CellValue::Int(2008)),
                    ("nb_same_sex", CellValue::Int(5)),
                ])],
            )
            .with(
                QueryShape::ParticipantsByYear,
                vec![row(&[
                    ("annee", CellValue::Int(2008)),
                    ("total", CellValue::Int(5)),
                ])],
            );
        let mut session = ReportSession::new(executor, RecordingSink::default());
        let report = session.sex_composition(&jane_born()).await.unwrap();

        assert_eq!(report.sex.as_deref(), Some("F"));
        assert_eq!(
            report.rows,
            vec![SexCompositionRow {
                year: 2008,
                same_sex: 5,
                total: 5,
                other_sex: 0
            }]
        );
        assert_eq!(session.sink().charts.len(), 1);
        assert_eq!(session.sink().charts[0].values, vec![5, 0]);

        let executed = session.executor.executed.lock().unwrap();
        assert_eq!(executed[1].params["sex"], "F");
    }

    #[tokio::test]
    async fn test_sex_composition_without_sex_is_empty() {
        let mut session = ReportSession::new(FakeExecutor::default(), RecordingSink::default());
        let report = session.sex_composition(&jane_born()).await.unwrap();

        assert_eq!(report, SexCompositionReport::default());
        assert_eq!(session.charts_emitted(), 0);
        assert_eq!(session.executor.executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_discipline_result_renders_empty_bar() {
        let mut session = ReportSession::new(FakeExecutor::default(), RecordingSink::default());
        let report = session.discipline_histogram(&jane_born()).await.unwrap();

        assert!(report.disciplines.is_empty());
        assert!(report.participations.is_empty());
        assert_eq!(session.sink().charts.len(), 1);
        assert_eq!(session.sink().charts[0].kind, ChartKind::Bar);
        assert!(session.sink().charts[0].is_empty());
    }

    #[tokio::test]
    async fn test_post_counts_line_chart() {
        let executor = FakeExecutor::default().with(
            QueryShape::PostMentionsByYear,
            vec![
                row(&[
                    ("annee", CellValue::from("2016")),
                    ("tweet_count", CellValue::Int(12)),
                ]),
                row(&[
                    ("annee", CellValue::from("2021")),
                    ("tweet_count", CellValue::Int(40)),
                ]),
            ],
        );
        let mut session = ReportSession::new(executor, RecordingSink::default());
        let filter = AthleteFilter::new("Jane Doe").unwrap();
        let report = session.post_counts(&filter).await.unwrap();

        assert_eq!(report.years, vec!["2016", "2021"]);
        assert_eq!(report.posts, vec![12, 40]);
        assert_eq!(session.sink().charts[0].kind, ChartKind::Line);
    }

    #[tokio::test]
    async fn test_homonym_candidates() {
        let executor = FakeExecutor::default().with(
            QueryShape::HomonymCandidates,
            vec![
                row(&[
                    ("born", CellValue::from("1988-02-11")),
                    ("country", CellValue::from("France")),
                ]),
                row(&[("born", CellValue::Null), ("country", CellValue::from("Kenya"))]),
            ],
        );
        let session = ReportSession::new(executor, RecordingSink::default());
        let filter = AthleteFilter::new("Jane Doe").unwrap();
        let candidates = session.homonym_candidates(&filter).await.unwrap();

        assert_eq!(
            candidates,
            vec![
                HomonymCandidate {
                    born: Some("1988-02-11".into()),
                    country: Some("France".into())
                },
                HomonymCandidate {
                    born: None,
                    country: Some("Kenya".into())
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_run_all_order() {
        let mut session = ReportSession::new(medal_executor(), RecordingSink::default());
        let summary = session
            .run_all(&jane_born(), MedalCharts::default())
            .await
            .unwrap();
        assert_eq!(summary.medals.rows.len(), 2);

        let shapes: Vec<&[&str]> = session
            .executor
            .executed
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.columns)
            .collect();
        assert_eq!(
            shapes,
            vec![
                QueryShape::PostMentionsByYear.columns(),
                QueryShape::MedalCountByYear.columns(),
                QueryShape::TotalContributionByYear.columns(),
                QueryShape::DisciplineParticipation.columns(),
                QueryShape::AthleteSex.columns(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_propagates_and_close_still_releases() {
        let mut session = ReportSession::new(FailingExecutor, RecordingSink::default());
        let err = session
            .run_all(&jane_born(), MedalCharts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ReportError::Graph(ref g) if g.is_retryable()));
        assert_eq!(session.charts_emitted(), 0);
        assert!(session.close().is_ok());
    }

    #[test]
    fn test_name_only_warning_once_per_operation() {
        let filter = AthleteFilter::new("Jane Doe").unwrap();
        let sex = build(QueryShape::AthleteSex, &filter);
        let same = build(QueryShape::SexCompositionByYear, &filter);
        let all = build(QueryShape::ParticipantsByYear, &filter);
        assert_eq!(sex.warnings.len(), 1);

        let warnings = distinct_warnings(&[&sex, &same, &all]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Jane Doe"));

        let dated = filter.with_born(Some("1985-08-21"));
        let medals = build(QueryShape::MedalCountByYear, &dated);
        let totals = build(QueryShape::TotalContributionByYear, &dated);
        assert!(distinct_warnings(&[&medals, &totals]).is_empty());
    }

    #[test]
    fn test_close_finishes_sink_once() {
        struct CountingSink(Arc<AtomicUsize>);

        impl ChartSink for CountingSink {
            fn emit(&mut self, _chart: &ChartSpec) -> Result<()> {
                Ok(())
            }

            fn finish(&mut self) -> Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let finished = Arc::new(AtomicUsize::new(0));
        let session = ReportSession::new(FakeExecutor::default(), CountingSink(finished.clone()));
        session.close().unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
