//! Inline HTML for the four screens. Each page is static markup plus a small
//! script that fetches JSON from the API on mount and on every filter change.
//! Fetches are tagged with a generation counter so a slow response that was
//! superseded by a newer request is discarded instead of overwriting it.

pub fn render_dashboard() -> String {
    shell("Dashboard", "dashboard", DASHBOARD_CONTENT)
}

pub fn render_entry() -> String {
    shell("New Entry", "entry", ENTRY_CONTENT)
}

pub fn render_history() -> String {
    shell("History", "history", HISTORY_CONTENT)
}

pub fn render_report() -> String {
    shell("Report", "report", REPORT_CONTENT)
}

fn shell(title: &str, active: &str, content: &str) -> String {
    let mut html = SHELL
        .replace("{{TITLE}}", title)
        .replace("{{STYLE}}", STYLE)
        .replace("{{CONTENT}}", content);
    for key in ["dashboard", "entry", "history", "report"] {
        let marker = format!("{{{{ACTIVE_{}}}}}", key.to_uppercase());
        html = html.replace(&marker, if key == active { " active" } else { "" });
    }
    html
}

const SHELL: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} | Stake Indicators</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <nav class="topbar no-print">
    <span class="brand">Stake Indicators</span>
    <a class="navlink{{ACTIVE_DASHBOARD}}" href="/">Dashboard</a>
    <a class="navlink{{ACTIVE_ENTRY}}" href="/entry">New Entry</a>
    <a class="navlink{{ACTIVE_HISTORY}}" href="/history">History</a>
    <a class="navlink{{ACTIVE_REPORT}}" href="/report">Report</a>
  </nav>
  <main class="page">
{{CONTENT}}
  </main>
</body>
</html>
"##;

const STYLE: &str = r##"
:root {
  --primary: #0069a8;
  --primary-dark: #00588d;
  --title: #157493;
  --bg: #f1f5f9;
  --ink: #1e293b;
  --muted: #64748b;
  --border: #e2e8f0;
  --good: #047857;
  --bad: #be123c;
}
* { box-sizing: border-box; }
body {
  margin: 0;
  min-height: 100vh;
  background: var(--bg);
  color: var(--ink);
  font-family: "Segoe UI", "Helvetica Neue", Arial, sans-serif;
}
.topbar {
  display: flex;
  align-items: center;
  gap: 18px;
  padding: 14px 28px;
  background: white;
  border-bottom: 1px solid var(--border);
}
.brand { font-weight: 700; color: var(--title); margin-right: 12px; }
.navlink {
  color: var(--muted);
  text-decoration: none;
  font-size: 0.9rem;
  font-weight: 600;
  padding: 6px 10px;
  border-radius: 8px;
}
.navlink:hover { background: var(--bg); }
.navlink.active { color: var(--primary); background: #e0f2fe; }
.page { max-width: 1100px; margin: 0 auto; padding: 24px 20px 48px; display: grid; gap: 20px; }
.page-head h1 { margin: 0; color: var(--title); font-size: 1.8rem; }
.page-head .subtitle { margin: 4px 0 0; color: var(--muted); font-size: 0.9rem; }
.card {
  background: white;
  border: 1px solid var(--border);
  border-radius: 16px;
  padding: 20px;
  display: grid;
  gap: 16px;
}
.card h2 { margin: 0; font-size: 1.1rem; }
.toolbar { display: flex; flex-wrap: wrap; align-items: center; justify-content: space-between; gap: 12px; }
.tabs { display: flex; gap: 4px; background: var(--bg); border-radius: 999px; padding: 4px; }
.tab {
  border: none;
  background: transparent;
  padding: 6px 12px;
  border-radius: 999px;
  font-size: 0.8rem;
  font-weight: 600;
  color: var(--muted);
  cursor: pointer;
}
.tab.active { background: white; color: var(--primary); box-shadow: 0 1px 3px rgba(15, 23, 42, 0.15); }
.week-nav { display: flex; align-items: center; gap: 8px; }
.week-nav span { font-weight: 700; min-width: 150px; text-align: center; }
button.plain {
  border: 1px solid var(--border);
  background: white;
  border-radius: 8px;
  padding: 6px 10px;
  cursor: pointer;
  font-weight: 600;
  color: var(--muted);
}
button.plain:hover { color: var(--primary); }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; }
.stat {
  border: 1px solid var(--border);
  border-radius: 12px;
  padding: 14px;
  display: grid;
  gap: 6px;
}
.stat .label { font-size: 0.72rem; font-weight: 700; text-transform: uppercase; color: var(--muted); letter-spacing: 0.06em; }
.stat .value { font-size: 1.9rem; font-weight: 800; }
.stat .secondary { font-size: 0.78rem; color: var(--muted); font-weight: 600; }
.stat .secondary .good { color: var(--good); }
.stat .secondary .bad { color: var(--bad); }
.table-wrap { overflow-x: auto; }
table { width: 100%; border-collapse: collapse; font-size: 0.85rem; }
th {
  text-align: left;
  padding: 10px 8px;
  font-size: 0.72rem;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  color: var(--muted);
  border-bottom: 2px solid var(--border);
}
td { padding: 10px 8px; border-bottom: 1px solid var(--bg); }
tr.total td { font-weight: 800; background: #f0f9ff; }
td.best { color: var(--good); font-weight: 700; }
td.worst { color: var(--bad); font-weight: 700; }
form.entry { display: grid; gap: 14px; max-width: 620px; }
.field { display: grid; gap: 6px; }
.field label { font-size: 0.75rem; font-weight: 700; text-transform: uppercase; color: var(--muted); }
.field input, .field select {
  border: 1px solid var(--border);
  border-radius: 10px;
  padding: 10px 12px;
  font-size: 0.95rem;
  background: #f8fafc;
}
.field input:focus, .field select:focus { outline: 2px solid var(--primary); background: white; }
.field-row { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
.extra { border: 1px solid #fde68a; background: #fffbeb; border-radius: 12px; padding: 12px; display: grid; gap: 6px; }
.extra.violet { border-color: #ddd6fe; background: #f5f3ff; }
button.primary {
  border: none;
  background: var(--primary);
  color: white;
  font-weight: 700;
  font-size: 1rem;
  border-radius: 10px;
  padding: 12px 16px;
  cursor: pointer;
}
button.primary:hover { background: var(--primary-dark); }
button.primary:disabled { opacity: 0.6; }
button.danger { border: none; background: var(--bad); color: white; font-weight: 700; border-radius: 10px; padding: 10px 14px; cursor: pointer; }
.status { min-height: 1.2em; font-size: 0.9rem; color: var(--muted); }
.status[data-type="error"] { color: var(--bad); }
.status[data-type="ok"] { color: var(--good); }
.pager { display: flex; align-items: center; justify-content: space-between; gap: 12px; }
.pager .info { font-size: 0.78rem; color: var(--muted); font-weight: 700; text-transform: uppercase; }
.filters { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 12px; }
.modal-backdrop {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.55);
  display: none;
  align-items: center;
  justify-content: center;
  padding: 16px;
}
.modal-backdrop.open { display: flex; }
.modal { background: white; border-radius: 16px; padding: 22px; width: min(420px, 100%); display: grid; gap: 14px; }
.chart-card { border: 1px solid var(--border); border-radius: 12px; padding: 12px; }
.chart-card h3 { margin: 0 0 8px; font-size: 0.9rem; }
.chart-grid-2 { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 14px; }
svg.chart { width: 100%; height: 220px; display: block; }
.chart-label { fill: var(--muted); font-size: 10px; }
.grid-line { stroke: var(--border); }
.legend { display: flex; flex-wrap: wrap; gap: 10px; justify-content: center; }
.legend .item { display: flex; align-items: center; gap: 5px; font-size: 0.75rem; color: var(--muted); font-weight: 600; }
.legend .dot { width: 10px; height: 10px; border-radius: 50%; }
.analysis-output { white-space: pre-wrap; font-size: 0.92rem; line-height: 1.5; min-height: 2em; }
.recent { display: grid; gap: 0; }
.recent .row { display: flex; justify-content: space-between; align-items: center; padding: 10px 4px; border-bottom: 1px solid var(--bg); gap: 10px; }
.recent .who { font-weight: 700; font-size: 0.88rem; }
.recent .meta { font-size: 0.75rem; color: var(--muted); }
.recent .val { font-size: 1.2rem; font-weight: 800; }
@media print {
  body { background: white; }
  .no-print { display: none !important; }
  .page { max-width: none; padding: 0; }
  .card { border: none; padding: 8px 0; break-inside: avoid; }
  @page { margin: 1cm; }
}
"##;

const DASHBOARD_CONTENT: &str = r##"
    <header class="page-head">
      <h1>Dashboard</h1>
      <p class="subtitle">Weekly indicators across the stake</p>
    </header>

    <section class="card">
      <div class="toolbar">
        <div class="week-nav">
          <button class="plain" id="prev-week" type="button" aria-label="Previous week">&lt;</button>
          <span id="range-label">Loading...</span>
          <button class="plain" id="next-week" type="button" aria-label="Next week">&gt;</button>
        </div>
        <div class="tabs" id="period-tabs">
          <button class="tab active" data-period="week" type="button">Week</button>
          <button class="tab" data-period="current-month" type="button">This month</button>
          <button class="tab" data-period="last-month" type="button">Last month</button>
          <button class="tab" data-period="last-90-days" type="button">90 days</button>
          <button class="tab" data-period="last-12-months" type="button">12 months</button>
        </div>
      </div>
      <div class="grid" id="cards"></div>
      <div class="status" id="status"></div>
    </section>

    <section class="card">
      <div class="toolbar">
        <h2 id="targets-title">Targets</h2>
        <div class="tabs" id="year-tabs"></div>
      </div>
      <div class="table-wrap">
        <table id="targets-table"></table>
      </div>
    </section>

    <script>
      const statusEl = document.getElementById('status');
      const cardsEl = document.getElementById('cards');
      const rangeLabelEl = document.getElementById('range-label');

      let definitions = null;
      let activePeriod = 'week';
      let weekAnchor = null;
      let year = new Date().getFullYear();
      let dashboardGen = 0;
      let targetsGen = 0;

      const setStatus = (message, type) => {
        statusEl.textContent = message || '';
        statusEl.dataset.type = type || '';
      };

      const fmt = (n) => Number.isInteger(n) ? n.toLocaleString() : n.toFixed(1);

      const periodToken = () => activePeriod === 'week'
        ? (weekAnchor || new Date().toISOString().slice(0, 10))
        : activePeriod;

      const renderCards = (cards) => {
        cardsEl.innerHTML = cards.map((card) => {
          let secondary = '';
          if (card.target > 0) {
            const met = card.gap === 0;
            secondary = `Target: ${fmt(card.target)} (<span class="${met ? 'good' : ''}">${card.progress_percent}%</span>)`;
          } else if (card.best.name !== '-') {
            secondary = `Top: ${card.best.name}`;
          } else {
            secondary = card.aggregation === 'avg' ? 'Average' : card.aggregation === 'sum' ? 'Total' : 'Current';
          }
          return `<div class="stat">
            <span class="label">${card.display_name}</span>
            <span class="value">${fmt(card.stake_total)}</span>
            <span class="secondary">${secondary}</span>
          </div>`;
        }).join('');
      };

      const loadDashboard = async () => {
        const gen = ++dashboardGen;
        setStatus('Loading...', '');
        const res = await fetch(`/api/dashboard?period=${encodeURIComponent(periodToken())}&year=${year}`);
        if (gen !== dashboardGen) return; // superseded by a newer request
        if (!res.ok) {
          setStatus(await res.text(), 'error');
          return;
        }
        const data = await res.json();
        if (gen !== dashboardGen) return;
        if (activePeriod === 'week') {
          weekAnchor = data.start;
          rangeLabelEl.textContent = data.week_label;
        } else {
          rangeLabelEl.textContent = `${data.start} to ${data.end}`;
        }
        renderCards(data.cards);
        setStatus('', '');
      };

      const renderTargets = (data) => {
        const table = document.getElementById('targets-table');
        const indicators = definitions.indicators;
        const header = `<tr><th>Unit</th>${indicators.map((i) => `<th>${i.display_name}</th>`).join('')}</tr>`;
        const totalRow = `<tr class="total"><td>Total</td>${indicators.map((i) =>
          `<td>${fmt(data.stake_totals[i.id] || 0)}</td>`).join('')}</tr>`;
        const rows = definitions.wards.map((ward) => {
          const cells = indicators.map((i) => {
            const value = data.matrix[ward.id] ? data.matrix[ward.id][i.id] : undefined;
            return `<td>${value === undefined ? '-' : fmt(value)}</td>`;
          }).join('');
          return `<tr><td>${ward.name}</td>${cells}</tr>`;
        }).join('');
        table.innerHTML = `<thead>${header}</thead><tbody>${totalRow}${rows}</tbody>`;
      };

      const loadTargets = async () => {
        const gen = ++targetsGen;
        document.getElementById('targets-title').textContent = `Targets ${year}`;
        const res = await fetch(`/api/targets?year=${year}`);
        if (gen !== targetsGen || !res.ok) return;
        const data = await res.json();
        if (gen !== targetsGen) return;
        renderTargets(data);
      };

      const changeWeek = (offset) => {
        const base = new Date((weekAnchor || new Date().toISOString().slice(0, 10)) + 'T12:00:00');
        base.setDate(base.getDate() + offset * 7);
        weekAnchor = base.toISOString().slice(0, 10);
        activePeriod = 'week';
        syncTabs();
        loadDashboard();
      };

      const syncTabs = () => {
        document.querySelectorAll('#period-tabs .tab').forEach((tab) => {
          tab.classList.toggle('active', tab.dataset.period === activePeriod);
        });
      };

      document.getElementById('prev-week').addEventListener('click', () => changeWeek(-1));
      document.getElementById('next-week').addEventListener('click', () => changeWeek(1));
      document.querySelectorAll('#period-tabs .tab').forEach((tab) => {
        tab.addEventListener('click', () => {
          activePeriod = tab.dataset.period;
          syncTabs();
          loadDashboard();
        });
      });

      const buildYearTabs = () => {
        const wrap = document.getElementById('year-tabs');
        const current = new Date().getFullYear();
        wrap.innerHTML = [current - 1, current, current + 1].map((y) =>
          `<button class="tab${y === year ? ' active' : ''}" data-year="${y}" type="button">${y}</button>`).join('');
        wrap.querySelectorAll('.tab').forEach((tab) => {
          tab.addEventListener('click', () => {
            year = Number(tab.dataset.year);
            wrap.querySelectorAll('.tab').forEach((t) => t.classList.toggle('active', t === tab));
            loadTargets();
            loadDashboard();
          });
        });
      };

      const init = async () => {
        try {
          const res = await fetch('/api/definitions');
          definitions = await res.json();
          buildYearTabs();
          await Promise.all([loadDashboard(), loadTargets()]);
        } catch (err) {
          setStatus('Could not load the dashboard. Try reloading the page.', 'error');
        }
      };
      init();
    </script>
"##;

const ENTRY_CONTENT: &str = r##"
    <header class="page-head">
      <h1>New Entry</h1>
      <p class="subtitle">Record the weekly indicators for a ward</p>
    </header>

    <section class="card">
      <form class="entry" id="entry-form">
        <div class="field-row">
          <div class="field">
            <label for="ward">Ward / Branch</label>
            <select id="ward" required><option value="">Select...</option></select>
          </div>
          <div class="field">
            <label for="indicator">Indicator</label>
            <select id="indicator" required><option value="">Select...</option></select>
          </div>
        </div>
        <div class="field-row">
          <div class="field">
            <label for="week">Reference Sunday</label>
            <input type="date" id="week" required />
          </div>
          <div class="field">
            <label for="value" id="value-label">Value</label>
            <input type="number" id="value" min="0" step="1" placeholder="0" required />
          </div>
        </div>

        <div class="extra" id="secondary-block" hidden>
          <div class="field">
            <label for="secondary-value">Unendowed members</label>
            <input type="number" id="secondary-value" min="0" step="1" placeholder="0" />
          </div>
        </div>

        <div class="extra violet" id="membership-block" hidden>
          <div class="field">
            <label for="membership-count">Ward membership total</label>
            <input type="number" id="membership-count" min="1" step="1" />
          </div>
          <span class="status" id="membership-hint"></span>
        </div>

        <div class="status" id="form-status"></div>
        <button class="primary" id="submit-btn" type="submit">Save Entry</button>
      </form>
    </section>

    <section class="card">
      <h2>Recent entries</h2>
      <div class="recent" id="recent"></div>
    </section>

    <script>
      const PRIMARY_SLUG = 'temple_recommends_endowed';
      const SECONDARY_SLUG = 'temple_recommends_unendowed';
      const MEMBERSHIP_SLUG = 'participating_members';

      const wardSelect = document.getElementById('ward');
      const indicatorSelect = document.getElementById('indicator');
      const secondaryBlock = document.getElementById('secondary-block');
      const membershipBlock = document.getElementById('membership-block');
      const formStatus = document.getElementById('form-status');
      const submitBtn = document.getElementById('submit-btn');

      let definitions = { wards: [], indicators: [] };

      const setStatus = (message, type) => {
        formStatus.textContent = message || '';
        formStatus.dataset.type = type || '';
      };

      const selectedIndicator = () =>
        definitions.indicators.find((i) => i.id === indicatorSelect.value) || null;
      const selectedWard = () =>
        definitions.wards.find((w) => w.id === wardSelect.value) || null;

      const syncExtras = () => {
        const indicator = selectedIndicator();
        const slug = indicator ? indicator.slug : '';
        secondaryBlock.hidden = slug !== PRIMARY_SLUG;
        membershipBlock.hidden = slug !== MEMBERSHIP_SLUG;
        document.getElementById('value-label').textContent =
          slug === PRIMARY_SLUG ? 'Endowed members' : 'Value';
        const ward = selectedWard();
        if (slug === MEMBERSHIP_SLUG && ward) {
          document.getElementById('membership-count').value = ward.membership_count;
          document.getElementById('membership-hint').textContent =
            `Current count on file: ${ward.membership_count}`;
        }
        setStatus('', '');
      };

      wardSelect.addEventListener('change', syncExtras);
      indicatorSelect.addEventListener('change', syncExtras);

      const loadRecent = async () => {
        const res = await fetch('/api/entries/recent');
        if (!res.ok) return;
        const entries = await res.json();
        const recentEl = document.getElementById('recent');
        if (!entries.length) {
          recentEl.innerHTML = '<div class="row"><span class="meta">No entries yet.</span></div>';
          return;
        }
        recentEl.innerHTML = entries.map((entry) => `
          <div class="row">
            <div>
              <div class="who">${entry.indicator_name}</div>
              <div class="meta">${entry.ward_name} &middot; ${entry.week_label}</div>
            </div>
            <div class="val">${entry.value}</div>
          </div>`).join('');
      };

      document.getElementById('entry-form').addEventListener('submit', async (event) => {
        event.preventDefault();
        setStatus('Saving...', '');
        submitBtn.disabled = true;
        try {
          const indicator = selectedIndicator();
          const payload = {
            ward_id: wardSelect.value || null,
            indicator_id: indicatorSelect.value || null,
            value: document.getElementById('value').value === '' ? null : Number(document.getElementById('value').value),
            week_start: document.getElementById('week').value || null,
          };
          if (indicator && indicator.slug === PRIMARY_SLUG) {
            const secondary = document.getElementById('secondary-value').value;
            payload.secondary_value = secondary === '' ? null : Number(secondary);
          }
          if (indicator && indicator.slug === MEMBERSHIP_SLUG) {
            const membership = document.getElementById('membership-count').value;
            payload.membership_count = membership === '' ? null : Number(membership);
          }

          const res = await fetch('/api/entries', {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify(payload)
          });
          const text = await res.text();
          if (!res.ok) {
            setStatus(text || 'The entry could not be saved.', 'error');
            return;
          }
          const result = JSON.parse(text);
          setStatus(result.message, result.outcome === 'saved' ? 'ok' : '');
          document.getElementById('value').value = '';
          document.getElementById('secondary-value').value = '';
          await loadRecent();
        } catch (err) {
          setStatus('Unexpected error. Try again.', 'error');
        } finally {
          submitBtn.disabled = false;
        }
      });

      const init = async () => {
        const res = await fetch('/api/definitions');
        definitions = await res.json();
        wardSelect.innerHTML = '<option value="">Select...</option>' +
          definitions.wards.map((w) => `<option value="${w.id}">${w.name}</option>`).join('');
        // The unendowed indicator is captured together with the endowed one.
        indicatorSelect.innerHTML = '<option value="">Select...</option>' +
          definitions.indicators
            .filter((i) => i.slug !== SECONDARY_SLUG)
            .map((i) => `<option value="${i.id}">${i.display_name}${i.slug === PRIMARY_SLUG ? ' (both counts)' : ''}</option>`)
            .join('');
        await loadRecent();
      };
      init();
    </script>
"##;

const HISTORY_CONTENT: &str = r##"
    <header class="page-head">
      <h1>History</h1>
      <p class="subtitle"><span id="total-count">0</span> recorded entries</p>
    </header>

    <section class="card no-print">
      <div class="filters">
        <div class="field">
          <label for="filter-wards">Wards</label>
          <select id="filter-wards" multiple size="4"></select>
        </div>
        <div class="field">
          <label for="filter-indicators">Indicators</label>
          <select id="filter-indicators" multiple size="4"></select>
        </div>
        <div class="field">
          <label for="filter-week">Week</label>
          <select id="filter-week"><option value="">All weeks</option></select>
        </div>
        <div class="field">
          <label for="filter-created-from">Entered from</label>
          <input type="date" id="filter-created-from" />
        </div>
        <div class="field">
          <label for="filter-created-to">Entered to</label>
          <input type="date" id="filter-created-to" />
        </div>
        <div class="field">
          <label for="filter-page-size">Per page</label>
          <select id="filter-page-size">
            <option value="15">15</option>
            <option value="50">50</option>
            <option value="100">100</option>
          </select>
        </div>
      </div>
      <div class="toolbar">
        <button class="plain" id="clear-filters" type="button">Clear filters</button>
        <div class="status" id="status"></div>
      </div>
    </section>

    <section class="card">
      <div class="table-wrap">
        <table>
          <thead>
            <tr><th>Week</th><th>Unit</th><th>Indicator</th><th>Value</th><th>Entered</th><th></th></tr>
          </thead>
          <tbody id="rows"></tbody>
        </table>
      </div>
      <div class="pager">
        <span class="info" id="page-info">Page 1</span>
        <div>
          <button class="plain" id="prev-page" type="button">&lt;</button>
          <button class="plain" id="next-page" type="button">&gt;</button>
        </div>
      </div>
    </section>

    <div class="modal-backdrop" id="edit-modal">
      <div class="modal">
        <h2 id="edit-title">Edit entry</h2>
        <div class="field">
          <label for="edit-week">Reference Sunday</label>
          <input type="date" id="edit-week" />
        </div>
        <div class="field">
          <label for="edit-value">Value</label>
          <input type="number" id="edit-value" min="0" step="1" />
        </div>
        <div class="status" id="edit-status"></div>
        <button class="primary" id="edit-save" type="button">Update</button>
        <button class="danger" id="edit-delete" type="button">Delete entry</button>
        <button class="plain" id="edit-close" type="button">Close</button>
      </div>
    </div>

    <script>
      let page = 1;
      let total = 0;
      let fetchGen = 0;
      let editing = null;
      let deleteArmed = false;

      const rowsEl = document.getElementById('rows');
      const statusEl = document.getElementById('status');
      const modal = document.getElementById('edit-modal');

      const setStatus = (message, type) => {
        statusEl.textContent = message || '';
        statusEl.dataset.type = type || '';
      };

      const multiValues = (id) =>
        Array.from(document.getElementById(id).selectedOptions).map((o) => o.value).join(',');

      const queryString = () => {
        const params = new URLSearchParams();
        params.set('page', page);
        params.set('page_size', document.getElementById('filter-page-size').value);
        const wards = multiValues('filter-wards');
        if (wards) params.set('wards', wards);
        const indicators = multiValues('filter-indicators');
        if (indicators) params.set('indicators', indicators);
        const week = document.getElementById('filter-week').value;
        if (week) params.set('week', week);
        const from = document.getElementById('filter-created-from').value;
        if (from) params.set('created_from', from);
        const to = document.getElementById('filter-created-to').value;
        if (to) params.set('created_to', to);
        return params.toString();
      };

      const fetchHistory = async () => {
        const gen = ++fetchGen;
        setStatus('Loading...', '');
        const res = await fetch(`/api/history?${queryString()}`);
        if (gen !== fetchGen) return;
        if (!res.ok) {
          setStatus(await res.text(), 'error');
          return;
        }
        const data = await res.json();
        if (gen !== fetchGen) return;
        total = data.total;
        document.getElementById('total-count').textContent = total;
        const pages = Math.max(1, Math.ceil(total / data.page_size));
        document.getElementById('page-info').textContent = `Page ${data.page} of ${pages}`;
        document.getElementById('prev-page').disabled = data.page <= 1;
        document.getElementById('next-page').disabled = data.page >= pages;
        rowsEl.innerHTML = data.entries.map((entry) => `
          <tr>
            <td>${entry.week_label}<br /><span class="status">${entry.week_start}</span></td>
            <td>${entry.ward_name}</td>
            <td>${entry.indicator_name}</td>
            <td><strong>${entry.value}</strong></td>
            <td>${new Date(entry.created_at).toLocaleString()}</td>
            <td><button class="plain" data-edit="${entry.id}" type="button">Edit</button></td>
          </tr>`).join('');
        rowsEl.querySelectorAll('[data-edit]').forEach((btn) => {
          btn.addEventListener('click', () => {
            editing = data.entries.find((e) => e.id === btn.dataset.edit);
            openModal();
          });
        });
        setStatus('', '');
      };

      const openModal = () => {
        if (!editing) return;
        deleteArmed = false;
        document.getElementById('edit-title').textContent = `${editing.indicator_name} - ${editing.ward_name}`;
        document.getElementById('edit-week').value = editing.week_start;
        document.getElementById('edit-value').value = editing.value;
        document.getElementById('edit-delete').textContent = 'Delete entry';
        document.getElementById('edit-status').textContent = '';
        modal.classList.add('open');
      };

      const closeModal = () => modal.classList.remove('open');

      document.getElementById('edit-close').addEventListener('click', closeModal);

      document.getElementById('edit-save').addEventListener('click', async () => {
        if (!editing) return;
        const body = {
          value: Number(document.getElementById('edit-value').value),
          week_start: document.getElementById('edit-week').value
        };
        const res = await fetch(`/api/entries/${editing.id}`, {
          method: 'PUT',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(body)
        });
        if (!res.ok) {
          const statusBox = document.getElementById('edit-status');
          statusBox.textContent = await res.text();
          statusBox.dataset.type = 'error';
          return;
        }
        closeModal();
        await fetchHistory();
      });

      document.getElementById('edit-delete').addEventListener('click', async () => {
        if (!editing) return;
        // First click arms the deletion, second click confirms it.
        if (!deleteArmed) {
          deleteArmed = true;
          document.getElementById('edit-delete').textContent = 'Confirm permanent delete?';
          return;
        }
        const res = await fetch(`/api/entries/${editing.id}`, { method: 'DELETE' });
        if (!res.ok) {
          const statusBox = document.getElementById('edit-status');
          statusBox.textContent = await res.text();
          statusBox.dataset.type = 'error';
          return;
        }
        closeModal();
        await fetchHistory();
      });

      const resetAndFetch = () => { page = 1; fetchHistory(); };
      ['filter-wards', 'filter-indicators', 'filter-week', 'filter-created-from',
       'filter-created-to', 'filter-page-size'].forEach((id) => {
        document.getElementById(id).addEventListener('change', resetAndFetch);
      });
      document.getElementById('clear-filters').addEventListener('click', () => {
        ['filter-wards', 'filter-indicators'].forEach((id) => {
          Array.from(document.getElementById(id).options).forEach((o) => { o.selected = false; });
        });
        ['filter-week', 'filter-created-from', 'filter-created-to'].forEach((id) => {
          document.getElementById(id).value = '';
        });
        resetAndFetch();
      });
      document.getElementById('prev-page').addEventListener('click', () => {
        if (page > 1) { page -= 1; fetchHistory(); }
      });
      document.getElementById('next-page').addEventListener('click', () => {
        page += 1; fetchHistory();
      });

      const init = async () => {
        const res = await fetch('/api/history/options');
        const options = await res.json();
        document.getElementById('filter-wards').innerHTML =
          options.wards.map((w) => `<option value="${w.id}">${w.name}</option>`).join('');
        document.getElementById('filter-indicators').innerHTML =
          options.indicators.map((i) => `<option value="${i.id}">${i.display_name}</option>`).join('');
        document.getElementById('filter-week').innerHTML = '<option value="">All weeks</option>' +
          options.weeks.map((w) => `<option value="${w.date}">${w.label}</option>`).join('');
        await fetchHistory();
      };
      init();
    </script>
"##;

const REPORT_CONTENT: &str = r##"
    <header class="page-head">
      <h1>Performance Report</h1>
      <p class="subtitle" id="report-range">Last 30 days</p>
    </header>

    <section class="card no-print">
      <div class="toolbar">
        <div class="status" id="status"></div>
        <div>
          <button class="plain" id="csv-btn" type="button">Export CSV</button>
          <button class="primary" id="print-btn" type="button">Print / PDF</button>
        </div>
      </div>
    </section>

    <section class="card">
      <div class="toolbar">
        <h2>Stake overview</h2>
        <span class="status" id="overview-meta"></span>
      </div>
      <div class="grid" id="overview-cards"></div>
    </section>

    <section class="card">
      <h2>Comparative ranking</h2>
      <p class="subtitle">Score normalized per member (value &divide; members &times; 1000)</p>
      <div class="table-wrap">
        <table id="ranking-table"></table>
      </div>
    </section>

    <section class="card">
      <h2>Weekly trend</h2>
      <div class="chart-grid-2" id="charts"></div>
      <div class="legend" id="legend"></div>
    </section>

    <section class="card no-print">
      <div class="toolbar">
        <h2>Narrative analysis</h2>
        <div>
          <select id="analysis-ward"></select>
          <button class="plain" id="analysis-btn" type="button">Generate</button>
        </div>
      </div>
      <div class="analysis-output" id="analysis-output"></div>
    </section>

    <script>
      const COLORS = ['#0069a8', '#0ea5e9', '#6366f1', '#8b5cf6', '#ec4899', '#f59e0b', '#10b981', '#f43f5e'];
      const statusEl = document.getElementById('status');
      let report = null;

      const setStatus = (message, type) => {
        statusEl.textContent = message || '';
        statusEl.dataset.type = type || '';
      };

      const fmt = (n) => Number.isInteger(n) ? n.toLocaleString() : n.toFixed(1);
      const fmtWeek = (iso) => `${iso.slice(8, 10)}/${iso.slice(5, 7)}`;

      const methodLabel = (method) =>
        method === 'avg' ? 'Average' : method === 'sum' ? 'Total' : 'Current';

      const renderOverview = () => {
        document.getElementById('overview-meta').textContent =
          `${report.wards.length} units | ${report.total_membership.toLocaleString()} members`;
        document.getElementById('overview-cards').innerHTML = report.indicators.map((ind) => `
          <div class="stat">
            <span class="label">${ind.display_name}</span>
            <span class="value">${fmt(ind.stake_total)}</span>
            <span class="secondary">${methodLabel(ind.aggregation)} &middot;
              <span class="good">${ind.best.name}</span> /
              <span class="bad">${ind.worst.name}</span></span>
          </div>`).join('');
      };

      const renderRanking = () => {
        const table = document.getElementById('ranking-table');
        const header = `<tr><th>Unit</th><th>Members</th>${report.indicators.map((ind) =>
          `<th>${ind.display_name}</th>`).join('')}</tr>`;
        const rows = report.wards.map((ward) => {
          const cells = report.indicators.map((ind) => {
            const idx = ind.by_ward.findIndex((w) => w.ward_id === ward.id);
            const entry = idx >= 0 ? ind.by_ward[idx] : null;
            const cls = idx === 0 ? 'best' : idx === ind.by_ward.length - 1 ? 'worst' : '';
            return `<td class="${cls}">${entry ? fmt(entry.value) : '-'}</td>`;
          }).join('');
          return `<tr><td>${ward.name}</td><td>${ward.membership}</td>${cells}</tr>`;
        }).join('');
        const totals = `<tr class="total"><td colspan="2">STAKE</td>${report.indicators.map((ind) =>
          `<td>${fmt(ind.stake_total)}</td>`).join('')}</tr>`;
        table.innerHTML = `<thead>${header}</thead><tbody>${rows}${totals}</tbody>`;
      };

      const lineChart = (series, weeks) => {
        const width = 520;
        const height = 220;
        const padX = 40;
        const padY = 28;
        let max = 1;
        series.forEach((s) => s.values.forEach((v) => { max = Math.max(max, v); }));
        const xStep = weeks.length > 1 ? (width - padX * 2) / (weeks.length - 1) : 0;
        const x = (i) => padX + i * xStep;
        const y = (v) => height - padY - (v / max) * (height - padY * 2);

        let grid = '';
        for (let t = 0; t <= 4; t += 1) {
          const value = (max * t) / 4;
          grid += `<line class="grid-line" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
          grid += `<text class="chart-label" x="${padX - 6}" y="${y(value) + 3}" text-anchor="end">${Math.round(value)}</text>`;
        }
        const labels = weeks.map((week, i) =>
          `<text class="chart-label" x="${x(i)}" y="${height - padY + 14}" text-anchor="middle">${fmtWeek(week)}</text>`).join('');
        const paths = series.map((s, si) => {
          const d = s.values.map((v, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(1)} ${y(v).toFixed(1)}`).join(' ');
          return `<path fill="none" stroke="${COLORS[si % COLORS.length]}" stroke-width="2" d="${d}" />`;
        }).join('');
        return `<svg class="chart" viewBox="0 0 ${width} ${height}">${grid}${labels}${paths}</svg>`;
      };

      const renderCharts = () => {
        const chartsEl = document.getElementById('charts');
        const weekly = report.indicators.filter((ind) => ind.aggregation !== 'snapshot');
        chartsEl.innerHTML = weekly.map((ind) => `
          <div class="chart-card">
            <h3>${ind.display_name}</h3>
            ${lineChart(report.weekly[ind.indicator_id] || [], report.weeks)}
          </div>`).join('');
        document.getElementById('legend').innerHTML = report.wards.map((ward, i) => `
          <span class="item"><span class="dot" style="background:${COLORS[i % COLORS.length]}"></span>${ward.name}</span>`).join('');
      };

      const typewriter = (el, text) => {
        el.textContent = '';
        let i = 0;
        const tick = () => {
          if (i >= text.length) return;
          el.textContent += text[i];
          i += 1;
          setTimeout(tick, 12);
        };
        tick();
      };

      document.getElementById('analysis-btn').addEventListener('click', async () => {
        const out = document.getElementById('analysis-output');
        const wardId = document.getElementById('analysis-ward').value;
        if (!wardId) return;
        out.textContent = 'Generating analysis...';
        try {
          const res = await fetch('/api/analysis', {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify({ ward_id: wardId })
          });
          if (!res.ok) {
            out.textContent = await res.text();
            return;
          }
          const data = await res.json();
          typewriter(out, data.text);
        } catch (err) {
          out.textContent = 'Analysis service is unavailable right now.';
        }
      });

      document.getElementById('csv-btn').addEventListener('click', () => {
        window.location = '/api/report.csv';
      });
      document.getElementById('print-btn').addEventListener('click', () => window.print());

      const init = async () => {
        setStatus('Loading...', '');
        const res = await fetch('/api/report');
        if (!res.ok) {
          setStatus('Could not load the report.', 'error');
          return;
        }
        report = await res.json();
        document.getElementById('report-range').textContent =
          `Last 30 days | ${report.start} to ${report.end} | generated ${report.generated_on}`;
        if (!report.indicators.length) {
          setStatus('No data recorded in the last 30 days.', 'error');
          return;
        }
        renderOverview();
        renderRanking();
        renderCharts();
        document.getElementById('analysis-ward').innerHTML =
          report.wards.map((w) => `<option value="${w.id}">${w.name}</option>`).join('');
        setStatus('', '');
      };
      init();
    </script>
"##;
