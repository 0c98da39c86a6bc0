/// Embedded page for the interactive views

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>relviz</title>
    <script src="https://d3js.org/d3.v7.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #fafafa;
            color: #222;
            display: flex;
            height: 100vh;
        }
        #sidebar {
            width: 280px;
            padding: 16px;
            border-right: 1px solid #ddd;
            overflow-y: auto;
            background: #fff;
        }
        #sidebar h1 { font-size: 18px; margin-bottom: 8px; }
        #sidebar h2 { font-size: 13px; margin: 14px 0 6px; text-transform: uppercase; color: #666; }
        #sidebar label { display: block; font-size: 12px; line-height: 1.6; }
        #meta { font-size: 12px; color: #666; }
        #dates input { width: 100%; margin-bottom: 4px; }
        #dates button { margin-right: 4px; }
        #views { flex: 1; display: flex; flex-wrap: wrap; overflow: auto; }
        .view { flex: 1 1 480px; min-height: 420px; padding: 8px; }
        .view h3 { font-size: 13px; color: #666; margin-bottom: 4px; }
        .cell.highlighted, .edge.highlighted { stroke: #222; stroke-width: 1.5; }
        .edge { fill: none; }
        .leaf { font-size: 10px; }
        .bucket.highlighted { fill: #222; }
        #tooltip {
            position: absolute;
            pointer-events: none;
            background: rgba(0, 0, 0, 0.8);
            color: #fff;
            padding: 6px 8px;
            border-radius: 4px;
            font-size: 12px;
            display: none;
        }
    </style>
</head>
<body>
    <div id="sidebar">
        <h1>relviz</h1>
        <div id="meta"></div>
        <h2>Dates</h2>
        <div id="dates">
            <input id="start" type="date">
            <input id="end" type="date">
            <button id="apply-dates">Apply</button>
            <button id="clear-dates">Reset</button>
        </div>
        <div id="filters"></div>
    </div>
    <div id="views"></div>
    <div id="tooltip"></div>

    <script>
    const tooltip = d3.select('#tooltip');
    const panels = {};

    async function api(method, path, body) {
        const res = await fetch(path, {
            method,
            headers: { 'Content-Type': 'application/json' },
            body: body === undefined ? undefined : JSON.stringify(body),
        });
        if (!res.ok) {
            const err = await res.json().catch(() => ({ error: res.statusText }));
            console.warn(err.error);
            return null;
        }
        return res.json();
    }

    function panel(view) {
        if (!panels[view]) {
            const div = d3.select('#views').append('div').attr('class', 'view');
            div.append('h3').text(view);
            panels[view] = div.append('svg').attr('width', '100%').attr('height', 400);
        }
        return panels[view];
    }

    function highlight(source, target) {
        api('POST', '/api/highlight', { source, target });
    }

    function unhighlight(source) {
        api('DELETE', '/api/highlight/' + source);
    }

    function showTip(html, event) {
        tooltip.style('display', 'block')
            .style('left', (event.pageX + 10) + 'px')
            .style('top', (event.pageY + 10) + 'px')
            .html(html);
    }

    function hideTip() { tooltip.style('display', 'none'); }

    function cellTip(d, info) {
        const lines = [`${d.source} &rarr; ${d.target}`];
        if (info) {
            for (const [side, attrs] of [['source', info.source], ['target', info.target]]) {
                for (const [key, value] of Object.entries(attrs || {})) lines.push(`${side} ${key}: ${value}`);
            }
        }
        const stats = info && info.stats ? info.stats : d;
        lines.push(`${stats.total} links, mean ${stats.mean.toFixed(4)}`);
        return lines.join('<br>');
    }

    function drawMatrix(p) {
        const svg = panel('matrix');
        svg.selectAll('*').remove();
        const size = Math.max(p.rows.length, p.columns.length, 1);
        const step = Math.max(4, Math.min(24, 360 / size));
        const g = svg.append('g').attr('transform', 'translate(20,20)');
        const rows = new Set(p.highlightedRows);
        const cols = new Set(p.highlightedColumns);

        g.selectAll('rect.cell').data(p.cells).enter().append('rect')
            .attr('class', d => 'cell' + (rows.has(d.y) || cols.has(d.x) ? ' highlighted' : ''))
            .attr('x', d => d.x * step)
            .attr('y', d => d.y * step)
            .attr('width', step - 1)
            .attr('height', step - 1)
            .attr('fill', d => d.color)
            .attr('fill-opacity', d => d.opacity)
            .on('mouseover', async (event, d) => {
                highlight('matrix', { type: 'pair', source: d.source, target: d.target });
                const info = await api('GET', `/api/matrix/cells/${encodeURIComponent(d.source)}/${encodeURIComponent(d.target)}`);
                showTip(cellTip(d, info), event);
            })
            .on('mouseout', () => { hideTip(); unhighlight('matrix'); });
    }

    function drawHierarchy(p) {
        const svg = panel('hierarchy');
        svg.selectAll('*').remove();
        const radius = 160;
        const byId = new Map(p.nodes.map(n => [n.id, { ...n, children: [] }]));
        let root = null;
        for (const n of byId.values()) {
            if (n.parent === null) root = n; else byId.get(n.parent).children.push(n);
        }
        if (!root) return;
        const tree = d3.hierarchy(root);
        d3.cluster().size([2 * Math.PI, radius])(tree);
        const pos = new Map();
        tree.each(d => pos.set(d.data.id, d));

        const g = svg.append('g').attr('transform', `translate(${radius + 60},${radius + 30})`);
        const line = d3.lineRadial().curve(d3.curveBundle.beta(0.85)).radius(d => d.y).angle(d => d.x);
        const marked = new Set(p.highlightedEdges);

        g.selectAll('path.edge').data(p.edges).enter().append('path')
            .attr('class', (d, i) => 'edge' + (marked.has(i) ? ' highlighted' : ''))
            .attr('d', d => line(d.path.map(id => pos.get(id))))
            .attr('stroke', d => d.color)
            .attr('stroke-opacity', d => d.opacity);

        g.selectAll('text.leaf').data(tree.leaves()).enter().append('text')
            .attr('class', 'leaf')
            .attr('transform', d => `rotate(${d.x * 180 / Math.PI - 90}) translate(${d.y + 4},0)${d.x >= Math.PI ? ' rotate(180)' : ''}`)
            .attr('text-anchor', d => d.x < Math.PI ? 'start' : 'end')
            .text(d => d.data.key)
            .on('mouseover', (event, d) => highlight('hierarchy', { type: 'node', identity: d.data.name }))
            .on('mouseout', () => unhighlight('hierarchy'));
    }

    function drawTimeline(p) {
        const svg = panel('timeline');
        svg.selectAll('*').remove();
        if (p.buckets.length === 0) return;
        const width = 460, height = 340;
        const dates = p.buckets.map(b => new Date(b.date));
        const x = d3.scaleTime().domain(d3.extent(dates)).range([40, width]);
        const y = d3.scaleLinear().domain([0, p.countMax]).range([height, 20]);
        const g = svg.append('g');

        g.append('g').attr('transform', `translate(0,${height})`).call(d3.axisBottom(x).ticks(5));
        g.append('g').attr('transform', 'translate(40,0)').call(d3.axisLeft(y).ticks(5));
        g.append('path')
            .datum(p.buckets)
            .attr('fill', 'none')
            .attr('stroke', '#4a7bd0')
            .attr('d', d3.line().x(b => x(new Date(b.date))).y(b => y(b.count)));

        const marked = new Set(p.highlightedDates);
        g.selectAll('circle.bucket').data(p.buckets).enter().append('circle')
            .attr('class', b => 'bucket' + (marked.has(b.date) ? ' highlighted' : ''))
            .attr('cx', b => x(new Date(b.date)))
            .attr('cy', b => y(b.count))
            .attr('r', 3)
            .attr('fill', '#4a7bd0');

        svg.on('click', event => {
            const [px] = d3.pointer(event);
            const date = x.invert(px).toISOString().slice(0, 10);
            api('POST', '/api/views/timeline/click', { date });
        });
    }

    const drawers = { matrix: drawMatrix, hierarchy: drawHierarchy, timeline: drawTimeline };

    function draw(view, payload) {
        const drawer = drawers[view];
        if (drawer) drawer(payload);
    }

    function drawFilters(session) {
        const root = d3.select('#filters');
        root.selectAll('*').remove();
        for (const [attribute, state] of Object.entries(session.filters)) {
            root.append('h2').text(`${attribute} (${state.kind})`);
            const selected = new Set(state.selected);
            for (const value of state.domain) {
                const label = root.append('label');
                label.append('input')
                    .attr('type', 'checkbox')
                    .property('checked', selected.has(value))
                    .on('change', function () {
                        if (this.checked) selected.add(value); else selected.delete(value);
                        api('POST', '/api/filters/' + encodeURIComponent(attribute), { values: [...selected] });
                    });
                label.append('span').text(' ' + value);
            }
        }
        const m = session.metadata;
        d3.select('#meta').text(`${m.totalRecords} records, ${m.totalLinks} links, ${m.totalPairs} pairs`);
    }

    async function refresh() {
        const session = await api('GET', '/api/session');
        if (session) drawFilters(session);
        const views = await api('GET', '/api/views');
        if (views) views.forEach(v => draw(v.view, v.payload));
    }

    d3.select('#apply-dates').on('click', () => {
        const start = document.getElementById('start').value;
        const end = document.getElementById('end').value;
        if (start && end) api('POST', '/api/date-range', { start, end });
    });
    d3.select('#clear-dates').on('click', () => api('DELETE', '/api/date-range'));

    const events = new EventSource('/api/events');
    let latest = 0;
    events.addEventListener('redraw', e => {
        const event = JSON.parse(e.data);
        if (event.version < latest) return;
        latest = event.version;
        draw(event.view, event.payload);
    });
    events.addEventListener('highlight', async e => {
        const event = JSON.parse(e.data);
        const view = await api('GET', '/api/views/' + event.view);
        if (view && view.version >= latest) draw(view.view, view.payload);
    });
    events.addEventListener('resync', () => refresh());

    refresh();
    </script>
</body>
</html>
"#;
