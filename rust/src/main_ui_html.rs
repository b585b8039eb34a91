pub fn build_main_ui_html() -> String {
    MAIN_UI_HTML.to_string()
}

const MAIN_UI_HTML: &str = r#"<!doctype html>
<html lang="ja">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>CRF Form Generator</title>
  <style>
    :root {
      --bg: #1f2024;
      --panel: #1b1c20;
      --line: #3f4248;
      --input-bg: #272a2f;
      --input-line: #4a4e55;
      --text: #f3f5f7;
      --muted: #9ca2ad;
      --accent: #4f8fd0;
      --btn-bg: #2a2d33;
      --btn-line: #5b616d;
      --font-sm: 12px;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      color: var(--text);
      background: var(--bg);
      font-family: "Yu Gothic UI", "Hiragino Kaku Gothic ProN", sans-serif;
      font-size: 14px;
    }
    .wrap { max-width: 1080px; margin: 0 auto; padding: 16px; }
    h1 { margin: 0 0 12px; font-size: 22px; letter-spacing: 0.03em; }
    h2 { margin: 0 0 8px; font-size: 16px; }
    .panel {
      border: 1px solid var(--line);
      background: var(--panel);
      padding: 12px;
      margin-bottom: 14px;
    }
    .row { display: flex; gap: 8px; flex-wrap: wrap; align-items: center; }
    .btn {
      border: 1px solid var(--btn-line);
      background: var(--btn-bg);
      color: var(--text);
      padding: 6px 14px;
      cursor: pointer;
      font-size: 13px;
    }
    .btn:hover { border-color: var(--accent); }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    .btn.primary { border-color: var(--accent); color: var(--accent); font-weight: 700; }
    input[type="text"], textarea {
      width: 100%;
      border: 1px solid var(--input-line);
      background: var(--input-bg);
      color: var(--text);
      padding: 7px 9px;
      font-family: inherit;
      font-size: 13px;
    }
    textarea { resize: vertical; min-height: 84px; white-space: pre-wrap; }
    input:focus, textarea:focus { outline: 1px solid var(--accent); }
    .field-label { font-size: 13px; color: var(--muted); margin: 10px 0 4px; }
    .status { color: var(--muted); font-size: var(--font-sm); min-height: 16px; margin-top: 6px; }
    .status.error { color: #e07a6a; }
    .section {
      border: 1px solid var(--line);
      background: var(--panel);
      padding: 10px 12px;
      margin-bottom: 10px;
    }
    .section-head { display: flex; align-items: center; gap: 8px; margin-bottom: 6px; }
    .section-no { color: var(--accent); font-weight: 700; }
    .badge {
      font-size: 11px;
      border: 1px solid var(--line);
      color: var(--muted);
      padding: 1px 6px;
    }
    .badge.fixed { color: #d8b25a; border-color: #d8b25a; }
    .badge.multi { color: var(--accent); border-color: var(--accent); }
    .fixed-value {
      border-left: 3px solid var(--line);
      background: var(--input-bg);
      color: var(--muted);
      padding: 8px 10px;
      white-space: pre-wrap;
      font-size: 13px;
    }
    .tabs { display: flex; gap: 6px; margin-bottom: 6px; }
    .tab {
      border: 1px solid var(--btn-line);
      background: var(--btn-bg);
      color: var(--muted);
      padding: 3px 12px;
      cursor: pointer;
      font-size: 12px;
    }
    .tab.active { border-color: var(--accent); color: var(--accent); font-weight: 700; }
    .option-preview { margin-top: 6px; font-size: var(--font-sm); color: var(--muted); }
    .option-preview div.active { color: var(--accent); }
    .history-entry {
      display: flex;
      align-items: center;
      gap: 10px;
      border-top: 1px solid var(--line);
      padding: 6px 0;
      font-size: 13px;
    }
    .history-entry:first-child { border-top: none; }
    .history-meta { flex: 1 1 auto; }
    .muted { color: var(--muted); }
    .hidden { display: none; }
  </style>
</head>
<body>
  <main class="wrap">
    <h1>CRF出力フォーム ジェネレーター</h1>

    <section class="panel" id="upload-panel">
      <h2>製品画像の解析</h2>
      <div class="field-label">製品画像 / スライド（.png .jpg .webp .pdf .pptx）</div>
      <input type="file" id="file-input" accept=".png,.jpg,.jpeg,.webp,.pdf,.pptx" />
      <div class="field-label">モデル番号（任意・履歴用）</div>
      <input type="text" id="product-model" placeholder="A2693" />
      <div class="field-label">最優先訴求ポイント（任意）</div>
      <input type="text" id="selling-point" placeholder="例: 巻取り式ケーブル" />
      <div class="row" style="margin-top: 10px;">
        <button class="btn primary" id="analyze-btn">解析してフォームを生成</button>
        <span class="status" id="analyze-status"></span>
      </div>
    </section>

    <section class="panel" id="history-panel">
      <h2>生成履歴</h2>
      <div id="history-list"><span class="muted">履歴はまだありません。</span></div>
    </section>

    <section id="form-panel" class="hidden">
      <div class="panel">
        <div class="row">
          <h2 style="flex: 1 1 auto;" id="form-title">CRF出力フォーム（27項目）</h2>
          <button class="btn" id="copy-all-btn">すべてコピー</button>
          <button class="btn" id="download-btn">ローカルにダウンロード</button>
        </div>
        <div class="row" style="margin-top: 8px;">
          <input type="text" id="drive-token" placeholder="Google OAuthアクセストークン" style="flex: 1 1 auto; width: auto;" />
          <button class="btn" id="drive-btn">Googleドライブにエクスポート</button>
        </div>
        <div class="status" id="export-status"></div>
      </div>
      <div id="form-root"></div>
    </section>
  </main>
  <script>
    const VARIANT_LABELS = ["A案", "B案", "C案"];

    async function parseApiResponse(res, fallback) {
      let data = {};
      try {
        data = await res.json();
      } catch (_) {
        data = {};
      }
      if (!res.ok || !data.ok) {
        throw new Error(data.error || fallback);
      }
      return data;
    }

    async function apiGet(path, fallback) {
      const res = await fetch(path, { cache: "no-store" });
      return parseApiResponse(res, fallback);
    }

    async function apiPost(path, payload, fallback) {
      const res = await fetch(path, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(payload)
      });
      return parseApiResponse(res, fallback);
    }

    function setStatus(id, message, isError) {
      const el = document.getElementById(id);
      el.textContent = message || "";
      el.classList.toggle("error", Boolean(isError));
    }

    function renderForm(session) {
      const panel = document.getElementById("form-panel");
      const root = document.getElementById("form-root");
      if (!session) {
        panel.classList.add("hidden");
        root.innerHTML = "";
        return;
      }
      panel.classList.remove("hidden");
      document.getElementById("form-title").textContent =
        "CRF出力フォーム（27項目）" + (session.product_model ? " - " + session.product_model : "");
      root.innerHTML = "";

      for (const section of session.sections) {
        const box = document.createElement("div");
        box.className = "section";

        const head = document.createElement("div");
        head.className = "section-head";
        const no = document.createElement("span");
        no.className = "section-no";
        no.textContent = section.number + ".";
        const label = document.createElement("span");
        label.textContent = section.label;
        head.appendChild(no);
        head.appendChild(label);
        if (!section.editable) {
          const badge = document.createElement("span");
          badge.className = "badge fixed";
          badge.textContent = "固定";
          head.appendChild(badge);
        }
        if (section.multi_option) {
          const badge = document.createElement("span");
          badge.className = "badge multi";
          badge.textContent = "3案";
          head.appendChild(badge);
        }
        box.appendChild(head);

        if (section.multi_option) {
          renderMultiOption(box, section);
        } else if (section.editable) {
          const input = section.multiline
            ? document.createElement("textarea")
            : document.createElement("input");
          if (!section.multiline) input.type = "text";
          input.value = section.value;
          input.addEventListener("change", async () => {
            try {
              const data = await apiPost(
                "/api/form/edit",
                { field: section.id, value: input.value },
                "保存に失敗しました"
              );
              renderForm(data.session);
            } catch (err) {
              alert("保存失敗: " + err.message);
            }
          });
          box.appendChild(input);
        } else {
          const fixed = document.createElement("div");
          fixed.className = "fixed-value";
          fixed.textContent = section.value;
          box.appendChild(fixed);
        }

        root.appendChild(box);
      }
    }

    function renderMultiOption(box, section) {
      const tabs = document.createElement("div");
      tabs.className = "tabs";
      VARIANT_LABELS.forEach((labelText, idx) => {
        const tab = document.createElement("button");
        tab.className = "tab" + (idx === section.selected ? " active" : "");
        tab.textContent = labelText;
        tab.addEventListener("click", async () => {
          try {
            const data = await apiPost(
              "/api/form/select",
              { field: section.id, index: idx },
              "案の切り替えに失敗しました"
            );
            renderForm(data.session);
          } catch (err) {
            alert("切り替え失敗: " + err.message);
          }
        });
        tabs.appendChild(tab);
      });
      box.appendChild(tabs);

      const input = section.multiline
        ? document.createElement("textarea")
        : document.createElement("input");
      if (!section.multiline) input.type = "text";
      input.value = section.options[section.selected] || "";
      input.addEventListener("change", async () => {
        try {
          const data = await apiPost(
            "/api/form/edit",
            { field: section.id, index: section.selected, value: input.value },
            "保存に失敗しました"
          );
          renderForm(data.session);
        } catch (err) {
          alert("保存失敗: " + err.message);
        }
      });
      box.appendChild(input);

      const preview = document.createElement("div");
      preview.className = "option-preview";
      section.options.forEach((option, idx) => {
        const line = document.createElement("div");
        line.className = idx === section.selected ? "active" : "";
        line.textContent = VARIANT_LABELS[idx] + ": " + option.split("\n")[0];
        preview.appendChild(line);
      });
      box.appendChild(preview);
    }

    async function loadForm() {
      try {
        const data = await apiGet("/api/form", "フォームの取得に失敗しました");
        renderForm(data.session);
      } catch (_) {
        renderForm(null);
      }
    }

    async function loadHistory() {
      const list = document.getElementById("history-list");
      let data;
      try {
        data = await apiGet("/api/history", "履歴の取得に失敗しました");
      } catch (err) {
        list.innerHTML = "";
        const span = document.createElement("span");
        span.className = "muted";
        span.textContent = "履歴の取得に失敗しました: " + err.message;
        list.appendChild(span);
        return;
      }

      list.innerHTML = "";
      if (!data.history || data.history.length === 0) {
        const span = document.createElement("span");
        span.className = "muted";
        span.textContent = "履歴はまだありません。";
        list.appendChild(span);
        return;
      }

      for (const entry of data.history) {
        const row = document.createElement("div");
        row.className = "history-entry";

        const meta = document.createElement("span");
        meta.className = "history-meta";
        meta.textContent = (entry.product_model || "（モデル不明）") + " / " + entry.created_at;
        row.appendChild(meta);

        const loadBtn = document.createElement("button");
        loadBtn.className = "btn";
        loadBtn.textContent = "読み込み";
        loadBtn.addEventListener("click", async () => {
          try {
            const result = await apiPost(
              "/api/history/load",
              { id: entry.id },
              "履歴の読み込みに失敗しました"
            );
            renderForm(result.session);
          } catch (err) {
            alert("読み込み失敗: " + err.message);
          }
        });
        row.appendChild(loadBtn);

        const deleteBtn = document.createElement("button");
        deleteBtn.className = "btn";
        deleteBtn.textContent = "削除";
        deleteBtn.addEventListener("click", async () => {
          if (!confirm("この履歴を削除しますか？")) {
            return;
          }
          try {
            await apiPost("/api/history/delete", { id: entry.id }, "削除に失敗しました");
            await loadHistory();
          } catch (err) {
            alert("削除失敗: " + err.message);
          }
        });
        row.appendChild(deleteBtn);

        list.appendChild(row);
      }
    }

    document.getElementById("analyze-btn").addEventListener("click", async () => {
      const fileInput = document.getElementById("file-input");
      const file = fileInput.files && fileInput.files[0];
      if (!file) {
        setStatus("analyze-status", "ファイルを選択してください。", true);
        return;
      }

      const form = new FormData();
      form.append("file", file);
      form.append("product_model", document.getElementById("product-model").value);
      form.append("main_selling_point", document.getElementById("selling-point").value);

      const button = document.getElementById("analyze-btn");
      button.disabled = true;
      setStatus("analyze-status", "解析中...（数十秒かかることがあります）", false);
      try {
        const res = await fetch("/api/analyze", { method: "POST", body: form });
        const data = await parseApiResponse(res, "解析に失敗しました");
        setStatus("analyze-status", "解析が完了しました。", false);
        renderForm(data.session);
        await loadHistory();
      } catch (err) {
        setStatus("analyze-status", err.message, true);
      } finally {
        button.disabled = false;
      }
    });

    document.getElementById("copy-all-btn").addEventListener("click", async () => {
      try {
        const data = await apiGet("/api/form/copy-text", "コピーに失敗しました");
        await navigator.clipboard.writeText(data.text);
        setStatus("export-status", "クリップボードにコピーしました。", false);
      } catch (err) {
        setStatus("export-status", "コピー失敗: " + err.message, true);
      }
    });

    document.getElementById("download-btn").addEventListener("click", () => {
      window.location.href = "/api/export";
    });

    document.getElementById("drive-btn").addEventListener("click", async () => {
      const token = document.getElementById("drive-token").value.trim();
      if (!token) {
        setStatus("export-status", "アクセストークンを入力してください。", true);
        return;
      }
      setStatus("export-status", "アップロード中...", false);
      try {
        const data = await apiPost(
          "/api/export/drive",
          { access_token: token },
          "Googleドライブへのアップロードに失敗しました"
        );
        setStatus("export-status", "アップロード完了: " + data.file_name, false);
        if (data.web_view_link) {
          window.open(data.web_view_link, "_blank");
        }
      } catch (err) {
        setStatus("export-status", err.message, true);
      }
    });

    void loadForm();
    void loadHistory();
  </script>
</body>
</html>
"#;
