mod analyze_trace;
