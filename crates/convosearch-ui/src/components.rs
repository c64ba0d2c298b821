use convosearch_shared::format::{
    confidence_percent, echoed_filter_labels, filtered_by, results_count_label,
};
use convosearch_shared::{
    ALL, BotAnswer, ChatBody, ChatEntry, DateFilter, FilterController, SearchHit, SearchResults,
    Ticket, TriageResponse,
};
use yew::{Callback, Html, Properties, TargetCast, classes, function_component, html};

use crate::app::FilterEvent;

#[derive(Properties, PartialEq)]
pub struct FilterBarProps {
    pub controller: FilterController,
    pub categories: Vec<String>,
    pub on_change: Callback<FilterEvent>,
}

#[function_component(FilterBar)]
pub fn filter_bar(props: &FilterBarProps) -> Html {
    let state = props.controller.state();
    let active = state.has_active_filters();

    let on_category = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: web_sys::Event| {
            let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
            on_change.emit(FilterEvent::Category(select.value()));
        })
    };

    let on_date = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: web_sys::Event| {
            let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
            on_change.emit(FilterEvent::Date(select.value()));
        })
    };

    let on_start = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: web_sys::Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            on_change.emit(FilterEvent::Start(input.value()));
        })
    };

    let on_end = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: web_sys::Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            on_change.emit(FilterEvent::End(input.value()));
        })
    };

    let on_clear = {
        let on_change = props.on_change.clone();
        move |_| on_change.emit(FilterEvent::Clear)
    };

    let range_style = if props.controller.custom_range_visible() {
        "display:flex;"
    } else {
        "display:none;"
    };

    html! {
        <div class={classes!("search-filters", active.then_some("filter-active"))}>
            <label>
                { "Category" }
                <select id="categoryFilter" onchange={on_category}>
                    <option value={ALL} selected={state.category() == ALL}>{ "All Categories" }</option>
                    {
                        for props.categories.iter().map(|category| html! {
                            <option value={category.clone()} selected={state.category() == category.as_str()}>
                                { category }
                            </option>
                        })
                    }
                </select>
            </label>
            <label>
                { "Date" }
                <select id="dateFilter" onchange={on_date}>
                    {
                        for DateFilter::OPTIONS.iter().map(|date| html! {
                            <option value={date.as_key()} selected={state.date() == *date}>
                                { date.label() }
                            </option>
                        })
                    }
                </select>
            </label>
            <div id="customDateRange" class="custom-date-range" style={range_style}>
                <input
                    id="startDate"
                    type="date"
                    value={props.controller.start_input().to_string()}
                    onchange={on_start}
                />
                <span>{ "to" }</span>
                <input
                    id="endDate"
                    type="date"
                    value={props.controller.end_input().to_string()}
                    onchange={on_end}
                />
            </div>
            <button type="button" class="clear-filters-btn" onclick={on_clear}>{ "Clear Filters" }</button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ResultsPanelProps {
    pub results: SearchResults,
    pub on_clear: Callback<()>,
}

#[function_component(ResultsPanel)]
pub fn results_panel(props: &ResultsPanelProps) -> Html {
    let labels = echoed_filter_labels(props.results.filters.category(), props.results.filters.date());
    let on_clear = props.on_clear.clone();

    html! {
        <>
            <div class="results-info">
                <span class="results-count">{ results_count_label(props.results.hits.len()) }</span>
                {
                    if labels.is_empty() {
                        html! {}
                    } else {
                        html! {
                            <>
                                <span class="filter-indicator">{ filtered_by(&labels) }</span>
                                <button type="button" class="clear-filters-btn" onclick={move |_| on_clear.emit(())}>
                                    { "Clear Filters" }
                                </button>
                            </>
                        }
                    }
                }
            </div>
            {
                if props.results.hits.is_empty() {
                    html! { <div class="no-results">{ "No results found." }</div> }
                } else {
                    html! {
                        <div class="results-list">
                            { for props.results.hits.iter().map(result_item) }
                        </div>
                    }
                }
            }
        </>
    }
}

fn result_item(hit: &SearchHit) -> Html {
    html! {
        <div class="result-item">
            <div class="result-content">{ &hit.content }</div>
            <div class="result-meta">
                <span class="result-source">{ &hit.source }</span>
                {
                    match hit.confidence {
                        Some(value) => html! {
                            <span class="result-confidence">{ confidence_percent(value) }</span>
                        },
                        None => html! {},
                    }
                }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ChatMessageProps {
    pub entry: ChatEntry,
    pub on_filter: Callback<FilterEvent>,
}

#[function_component(ChatMessage)]
pub fn chat_message(props: &ChatMessageProps) -> Html {
    match &props.entry.body {
        ChatBody::Question(text) => html! {
            <div class="message user-message">{ text }</div>
        },
        ChatBody::Error(message) => html! {
            <div class="message bot-message error">{ message }</div>
        },
        ChatBody::Answer(answer) => bot_message(answer, &props.on_filter),
    }
}

fn bot_message(answer: &BotAnswer, on_filter: &Callback<FilterEvent>) -> Html {
    let labels = answer.filters.labels();
    let on_clear = on_filter.clone();

    html! {
        <div class="message bot-message">
            <div class="answer">{ &answer.answer }</div>
            {
                if answer.sources.is_empty() {
                    html! {}
                } else {
                    html! {
                        <div class="sources">
                            <strong>{ "Sources:" }</strong>
                            <ul>
                                { for answer.sources.iter().map(|source| html! { <li>{ source }</li> }) }
                            </ul>
                        </div>
                    }
                }
            }
            <div class="confidence">{ format!("Confidence: {}", confidence_percent(answer.confidence)) }</div>
            {
                if labels.is_empty() {
                    html! {}
                } else {
                    html! {
                        <div class="filter-summary">
                            <strong>{ "Active Filters:" }</strong>
                            { format!(" {}", labels.join(", ")) }
                            <button type="button" class="clear-filters-btn" onclick={move |_| on_clear.emit(FilterEvent::Clear)}>
                                { "Clear Filters" }
                            </button>
                        </div>
                    }
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TriageCardProps {
    pub triage: TriageResponse,
    pub on_create_ticket: Callback<()>,
}

#[function_component(TriageCard)]
pub fn triage_card(props: &TriageCardProps) -> Html {
    let triage = &props.triage;
    let on_create_ticket = props.on_create_ticket.clone();

    html! {
        <div class="triage-result">
            <div class="kv">
                <strong>{ "Classification" }</strong>
                <span class={format!("classification {}", triage.classification)}>
                    { &triage.classification }
                </span>
            </div>
            <div class="kv">
                <strong>{ "Confidence" }</strong>
                <span>{ confidence_percent(triage.confidence) }</span>
            </div>
            <div class="suggested-reply">
                <strong>{ "Suggested reply" }</strong>
                <p>{ &triage.suggested_reply }</p>
            </div>
            {
                if triage.sources.is_empty() {
                    html! {}
                } else {
                    html! {
                        <div class="sources">
                            <strong>{ "Sources:" }</strong>
                            <ul>
                                { for triage.sources.iter().map(|source| html! { <li>{ source }</li> }) }
                            </ul>
                        </div>
                    }
                }
            }
            <button
                type="button"
                class={if triage.classification == "escalate" { "btn danger" } else { "btn" }}
                onclick={move |_| on_create_ticket.emit(())}
            >
                { "Create Ticket" }
            </button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TicketTableProps {
    pub tickets: Vec<Ticket>,
}

#[function_component(TicketTable)]
pub fn ticket_table(props: &TicketTableProps) -> Html {
    html! {
        <div class="panel tickets">
            <div class="header">{ "Recent tickets" }</div>
            {
                if props.tickets.is_empty() {
                    html! { <div class="no-results">{ "No tickets yet." }</div> }
                } else {
                    html! {
                        <table>
                            <thead>
                                <tr>
                                    <th>{ "Ticket" }</th>
                                    <th>{ "Status" }</th>
                                    <th>{ "Class" }</th>
                                    <th>{ "Created" }</th>
                                    <th>{ "Message" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                {
                                    for props.tickets.iter().map(|ticket| html! {
                                        <tr key={ticket.ticket_id.clone()}>
                                            <td>{ &ticket.ticket_id }</td>
                                            <td>{ &ticket.status }</td>
                                            <td>{ &ticket.classification }</td>
                                            <td>{ ticket.created_at.clone().unwrap_or_default() }</td>
                                            <td>{ &ticket.customer_message }</td>
                                        </tr>
                                    })
                                }
                            </tbody>
                        </table>
                    }
                }
            }
        </div>
    }
}
