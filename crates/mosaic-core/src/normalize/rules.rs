use crate::tiles::TileKind;

/// One metric the rule extracts into the canonical `metrics` map.
pub(crate) struct MetricField {
    /// Canonical metric name.
    pub name: &'static str,
    /// Accepted backend spellings, tried in order.
    pub aliases: &'static [&'static str],
    /// Whether the metric defaults to 0 when absent. Headline metrics do;
    /// optional extras are simply omitted.
    pub default_zero: bool,
}

/// A payload key holding a time series the rule lifts into a chart.
pub(crate) struct SeriesField {
    pub key: &'static str,
    pub title: &'static str,
}

/// Per-kind normalization rule: the bounded set of fields this tile is
/// known to carry.
pub(crate) struct TileRule {
    pub fields: &'static [MetricField],
    pub series: &'static [SeriesField],
}

impl TileRule {
    /// Whether `key` is one of this rule's known payload spellings. Used as
    /// the payload marker when unwrapping response envelopes.
    pub fn knows(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.aliases.contains(&key))
            || self.series.iter().any(|s| s.key == key)
    }
}

const MARKET_SIZE: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "tam",
            aliases: &["tam", "total_addressable_market", "totalAddressableMarket"],
            default_zero: true,
        },
        MetricField {
            name: "sam",
            aliases: &["sam", "serviceable_addressable_market", "serviceableAddressableMarket"],
            default_zero: true,
        },
        MetricField {
            name: "som",
            aliases: &["som", "serviceable_obtainable_market", "serviceableObtainableMarket"],
            default_zero: true,
        },
        MetricField {
            name: "growth_rate",
            aliases: &["growth_rate", "growthRate", "cagr"],
            default_zero: false,
        },
    ],
    series: &[],
};

const COMPETITION: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "competitor_count",
            aliases: &["competitor_count", "competitorCount", "total_competitors"],
            default_zero: true,
        },
        MetricField {
            name: "intensity",
            aliases: &["intensity", "competition_level", "competitionLevel"],
            default_zero: false,
        },
        MetricField {
            name: "top_competitors",
            aliases: &["top_competitors", "topCompetitors", "competitors"],
            default_zero: false,
        },
    ],
    series: &[],
};

const SENTIMENT: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "score",
            aliases: &["score", "sentiment_score", "sentimentScore"],
            default_zero: true,
        },
        MetricField {
            name: "positive",
            aliases: &["positive", "positive_pct", "positivePct"],
            default_zero: false,
        },
        MetricField {
            name: "negative",
            aliases: &["negative", "negative_pct", "negativePct"],
            default_zero: false,
        },
        MetricField {
            name: "neutral",
            aliases: &["neutral", "neutral_pct", "neutralPct"],
            default_zero: false,
        },
    ],
    series: &[SeriesField {
        key: "sentiment_trend",
        title: "Sentiment over time",
    }],
};

const NEWS_ANALYSIS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "article_count",
            aliases: &["article_count", "articleCount", "total_articles"],
            default_zero: true,
        },
        MetricField {
            name: "sentiment",
            aliases: &["sentiment", "news_sentiment", "newsSentiment"],
            default_zero: false,
        },
        MetricField {
            name: "top_story",
            aliases: &["top_story", "topStory"],
            default_zero: false,
        },
    ],
    series: &[],
};

const GOOGLE_TRENDS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "interest",
            aliases: &["interest", "current_interest", "currentInterest"],
            default_zero: true,
        },
        MetricField {
            name: "direction",
            aliases: &["direction", "trend_direction", "trendDirection"],
            default_zero: false,
        },
    ],
    series: &[
        SeriesField {
            key: "timeline",
            title: "Interest over time",
        },
        SeriesField {
            key: "interest_over_time",
            title: "Interest over time",
        },
    ],
};

const REDDIT_SIGNALS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "mentions",
            aliases: &["mentions", "mention_count", "mentionCount"],
            default_zero: true,
        },
        MetricField {
            name: "subreddits",
            aliases: &["subreddits", "subreddit_count", "subredditCount"],
            default_zero: false,
        },
        MetricField {
            name: "engagement",
            aliases: &["engagement", "engagement_score", "engagementScore"],
            default_zero: false,
        },
    ],
    series: &[SeriesField {
        key: "mention_trend",
        title: "Mentions over time",
    }],
};

const TWITTER_SIGNALS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "mentions",
            aliases: &["mentions", "mention_count", "mentionCount"],
            default_zero: true,
        },
        MetricField {
            name: "engagement",
            aliases: &["engagement", "engagement_score", "engagementScore"],
            default_zero: false,
        },
        MetricField {
            name: "reach",
            aliases: &["reach", "estimated_reach", "estimatedReach"],
            default_zero: false,
        },
    ],
    series: &[SeriesField {
        key: "mention_trend",
        title: "Mentions over time",
    }],
};

const AMAZON_REVIEWS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "review_count",
            aliases: &["review_count", "reviewCount", "total_reviews"],
            default_zero: true,
        },
        MetricField {
            name: "average_rating",
            aliases: &["average_rating", "averageRating", "avg_rating"],
            default_zero: false,
        },
        MetricField {
            name: "complaint_themes",
            aliases: &["complaint_themes", "complaintThemes", "top_complaints"],
            default_zero: false,
        },
    ],
    series: &[],
};

const YOUTUBE_SIGNALS: TileRule = TileRule {
    fields: &[
        MetricField {
            name: "video_count",
            aliases: &["video_count", "videoCount", "total_videos"],
            default_zero: true,
        },
        MetricField {
            name: "total_views",
            aliases: &["total_views", "totalViews", "views"],
            default_zero: false,
        },
        MetricField {
            name: "engagement",
            aliases: &["engagement", "engagement_score", "engagementScore"],
            default_zero: false,
        },
    ],
    series: &[],
};

/// Rule for kinds outside the well-known set: nothing extractable, so the
/// normalizer falls back to the placeholder metric plus pass-through.
const GENERIC: TileRule = TileRule {
    fields: &[],
    series: &[],
};

pub(crate) fn rule_for(kind: &TileKind) -> &'static TileRule {
    match kind.as_str() {
        "market_size" => &MARKET_SIZE,
        "competition" => &COMPETITION,
        "sentiment" => &SENTIMENT,
        "news_analysis" => &NEWS_ANALYSIS,
        "google_trends" => &GOOGLE_TRENDS,
        "reddit_signals" => &REDDIT_SIGNALS,
        "twitter_signals" => &TWITTER_SIGNALS,
        "amazon_reviews" => &AMAZON_REVIEWS,
        "youtube_signals" => &YOUTUBE_SIGNALS,
        _ => &GENERIC,
    }
}
