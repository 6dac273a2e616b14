//! Cypher query builder for the report shapes.
//!
//! Each shape has one template. The athlete filter decides which optional
//! constraints are spliced into the template's slots; the slots only ever
//! receive fixed Cypher fragments, and every caller-supplied value is sent
//! as a bound parameter.

use std::collections::BTreeMap;

use neo4rs::query;
use olympics_core::{AthleteFilter, Disambiguation};

/// Template slot for the athlete property map.
const ATHLETE_SLOT: &str = "{athlete}";
/// Template slot for the property map on the represented country node.
const COUNTRY_SLOT: &str = "{country}";
/// Template slot for an extra represented-country pattern.
const REPRESENTS_SLOT: &str = "{represents}";

const POST_MENTIONS_BY_YEAR: &str = "\
MATCH (a:athlete {athlete})<-[:MENTIONS_ATHLETE]-(t:tweet){represents}
RETURN substring(t.date, 0, 4) AS annee, count(t) AS tweet_count
ORDER BY annee";

const MEDAL_COUNT_BY_YEAR: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete})-[h:HAS_RESULT]->(r:result)-[:AWARDS]->(m:medal),
      (g)<-[:PARTICIPATES_IN]-(c:country{country})-[o:OWNS_RESULT]->(res:result),
      (a)-[:REPRESENTS]->(c)
WHERE g.edition_id = o.edition_country AND o.edition_country = h.edition_athlete
RETURN g.year AS annee, count(DISTINCT m) AS nombre_de_medailles_athlete, res.total AS total_medailles_pays
ORDER BY annee";

const TOTAL_CONTRIBUTION_BY_YEAR: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete}),
      (g)<-[:PARTICIPATES_IN]-(c:country{country})-[o:OWNS_RESULT]->(res:result),
      (a)-[:REPRESENTS]->(c)
WHERE g.edition_id = o.edition_country
RETURN g.year AS annee, res.total AS total_medailles_pays
ORDER BY annee";

const DISCIPLINE_PARTICIPATION: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete})-[]->(d:discipline){represents}
RETURN d.discipline AS discipline, count(DISTINCT g) AS nb_participations
ORDER BY discipline";

const ATHLETE_SEX: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete}){represents}
RETURN DISTINCT a.sex AS sexe";

const SEX_COMPOSITION_BY_YEAR: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete}){represents},
      (g)<-[:PLAYS_IN]-(autre:athlete {sex: $sex})
RETURN g.year AS annee, count(DISTINCT autre) AS nb_same_sex
ORDER BY annee";

const PARTICIPANTS_BY_YEAR: &str = "\
MATCH (g:GamesEdition)<-[:PLAYS_IN]-(a:athlete {athlete}){represents},
      (g)<-[:PLAYS_IN]-(autre:athlete)
RETURN g.year AS annee, count(DISTINCT autre) AS total
ORDER BY annee";

const HOMONYM_CANDIDATES: &str = "\
MATCH (a:athlete {athlete})
OPTIONAL MATCH (a)-[:REPRESENTS]->(c:country)
RETURN DISTINCT a.born AS born, c.country AS country
ORDER BY born, country";

/// The fixed set of read queries the reports issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryShape {
    /// Tweets mentioning the athlete, per year.
    PostMentionsByYear,
    /// Medals won by the athlete per games year, with the country total.
    MedalCountByYear,
    /// Country medal total for every games year the athlete played in.
    TotalContributionByYear,
    /// Distinct editions per discipline the athlete took part in.
    DisciplineParticipation,
    /// Athletes of a given sex (`$sex`) per edition the athlete played in.
    SexCompositionByYear,
    /// The athlete's recorded sex.
    AthleteSex,
    /// All athletes per edition the athlete played in.
    ParticipantsByYear,
    /// Every (birth date, country) pair recorded under a name.
    HomonymCandidates,
}

impl QueryShape {
    /// Column aliases returned by this shape, in RETURN order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::PostMentionsByYear => &["annee", "tweet_count"],
            Self::MedalCountByYear => &[
                "annee",
                "nombre_de_medailles_athlete",
                "total_medailles_pays",
            ],
            Self::TotalContributionByYear => &["annee", "total_medailles_pays"],
            Self::DisciplineParticipation => &["discipline", "nb_participations"],
            Self::SexCompositionByYear => &["annee", "nb_same_sex"],
            Self::AthleteSex => &["sexe"],
            Self::ParticipantsByYear => &["annee", "total"],
            Self::HomonymCandidates => &["born", "country"],
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Self::PostMentionsByYear => POST_MENTIONS_BY_YEAR,
            Self::MedalCountByYear => MEDAL_COUNT_BY_YEAR,
            Self::TotalContributionByYear => TOTAL_CONTRIBUTION_BY_YEAR,
            Self::DisciplineParticipation => DISCIPLINE_PARTICIPATION,
            Self::SexCompositionByYear => SEX_COMPOSITION_BY_YEAR,
            Self::AthleteSex => ATHLETE_SEX,
            Self::ParticipantsByYear => PARTICIPANTS_BY_YEAR,
            Self::HomonymCandidates => HOMONYM_CANDIDATES,
        }
    }

    /// Shapes that already match the represented country node `c`.
    fn has_country_node(&self) -> bool {
        matches!(
            self,
            Self::MedalCountByYear | Self::TotalContributionByYear
        )
    }
}

/// A finished Cypher query: text plus bound string parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CypherQuery {
    pub text: String,
    pub params: BTreeMap<String, String>,
    pub columns: &'static [&'static str],
}

impl CypherQuery {
    /// Convert into a neo4rs query with all parameters bound.
    pub fn to_neo4j(&self) -> neo4rs::Query {
        self.params
            .iter()
            .fold(query(&self.text), |q, (key, value)| {
                q.param(key, value.clone())
            })
    }
}

/// A query together with how the athlete was matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub shape: QueryShape,
    pub variant: Disambiguation,
    pub query: CypherQuery,
    /// Warnings the caller should surface before running the query.
    pub warnings: Vec<String>,
}

impl BuiltQuery {
    /// Bind an extra parameter required by the shape (e.g. `$sex`).
    pub fn bind(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.params.insert(key.to_string(), value.into());
        self
    }
}

/// Build the query for `shape`, matching the athlete as narrowly as the
/// filter allows.
pub fn build(shape: QueryShape, filter: &AthleteFilter) -> BuiltQuery {
    // Candidate listing is the remedy for homonyms: always by name alone.
    let variant = match shape {
        QueryShape::HomonymCandidates => Disambiguation::NameOnly,
        _ => filter.disambiguation(),
    };

    let mut params = BTreeMap::new();
    params.insert("name".to_string(), filter.name.clone());

    let (athlete, country, represents) = match variant {
        Disambiguation::BirthDate => {
            params.insert("born".to_string(), filter.born.clone().unwrap_or_default());
            ("{name: $name, born: $born}", "", "")
        }
        Disambiguation::Country => {
            params.insert(
                "country".to_string(),
                filter.country.clone().unwrap_or_default(),
            );
            if shape.has_country_node() {
                ("{name: $name}", " {country: $country}", "")
            } else {
                (
                    "{name: $name}",
                    "",
                    ",\n      (a)-[:REPRESENTS]->(:country {country: $country})",
                )
            }
        }
        Disambiguation::NameOnly => ("{name: $name}", "", ""),
    };

    let text = shape
        .template()
        .replace(ATHLETE_SLOT, athlete)
        .replace(COUNTRY_SLOT, country)
        .replace(REPRESENTS_SLOT, represents);

    let mut warnings = Vec::new();
    if variant.is_ambiguous() && shape != QueryShape::HomonymCandidates {
        warnings.push(format!(
            "Possible duplicates: athletes sharing the name '{}' are aggregated together; \
             provide a birth date or country to disambiguate",
            filter.name
        ));
    }

    BuiltQuery {
        shape,
        variant,
        query: CypherQuery {
            text,
            params,
            columns: shape.columns(),
        },
        warnings,
    }
}
